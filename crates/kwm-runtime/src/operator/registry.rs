#![forbid(unsafe_code)]

//! Operator type registry and instance creation.

use std::cell::Cell;
use std::rc::Rc;

use ahash::AHashMap;
use thiserror::Error;

use super::instance::{MacroBuilder, MacroParent, Operator, OperatorId};
use super::OperatorType;
use crate::properties::Properties;
use crate::reports::SharedReports;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("operator idname must not be empty")]
    EmptyIdname,
    #[error("operator '{0}' is already registered")]
    Duplicate(String),
    #[error("macro '{macro_idname}' step '{step}' is not a registered operator")]
    UnknownMacroStep { macro_idname: String, step: String },
}

/// Name-indexed operator types.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    types: AHashMap<String, Rc<OperatorType>>,
    next_instance: Cell<u64>,
}

impl OperatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ty` under its idname.
    ///
    /// A duplicate idname keeps the original registration. Every macro step
    /// must already be registered.
    pub fn register(&mut self, ty: OperatorType) -> Result<Rc<OperatorType>, RegistryError> {
        if ty.idname.is_empty() {
            tracing::error!(target: "kwm.operator", name = %ty.name, "operator registered without an idname");
            return Err(RegistryError::EmptyIdname);
        }
        if self.types.contains_key(&ty.idname) {
            tracing::warn!(target: "kwm.operator", idname = %ty.idname, "operator already registered, keeping the original");
            return Err(RegistryError::Duplicate(ty.idname));
        }
        if let Some(step) = ty
            .macro_steps
            .iter()
            .find(|s| !self.types.contains_key(&s.idname))
        {
            tracing::error!(
                target: "kwm.operator",
                idname = %ty.idname,
                step = %step.idname,
                "macro step is not a registered operator"
            );
            return Err(RegistryError::UnknownMacroStep {
                macro_idname: ty.idname.clone(),
                step: step.idname.clone(),
            });
        }
        let idname = ty.idname.clone();
        let ty = Rc::new(ty);
        self.types.insert(idname, Rc::clone(&ty));
        tracing::debug!(target: "kwm.operator", idname = %ty.idname, "registered operator type");
        Ok(ty)
    }

    /// Remove a type. Live instances keep their own handle to it.
    pub fn unregister(&mut self, idname: &str) -> Option<Rc<OperatorType>> {
        self.types.remove(idname)
    }

    /// Look up a type, logging misses.
    #[must_use]
    pub fn find(&self, idname: &str) -> Option<Rc<OperatorType>> {
        let found = self.lookup(idname);
        if found.is_none() {
            tracing::debug!(target: "kwm.operator", %idname, "unknown operator");
        }
        found
    }

    pub(crate) fn lookup(&self, idname: &str) -> Option<Rc<OperatorType>> {
        self.types.get(idname).cloned()
    }

    #[must_use]
    pub fn contains(&self, idname: &str) -> bool {
        self.types.contains_key(idname)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered idnames in sorted order.
    #[must_use]
    pub fn idnames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Total instances created so far, macro children included.
    #[must_use]
    pub fn instances_created(&self) -> u64 {
        self.next_instance.get()
    }

    pub(crate) fn next_instance_id(&self) -> OperatorId {
        let id = self.next_instance.get();
        self.next_instance.set(id + 1);
        OperatorId(id)
    }

    /// Create an instance of `ty`.
    ///
    /// Properties start from the type's defaults with `properties` applied
    /// on top. `reports` shares the caller's list; without it the instance
    /// owns a fresh one. Macro types get their steps flattened into the
    /// root's child list.
    #[must_use]
    pub fn create_instance(
        &self,
        ty: &Rc<OperatorType>,
        properties: Option<&Properties>,
        reports: Option<SharedReports>,
    ) -> Operator {
        let mut values = ty.properties.clone();
        if let Some(props) = properties {
            values.merge_from(props);
        }
        let mut op = Operator::new(self.next_instance_id(), Rc::clone(ty), values, reports);
        if ty.is_macro() {
            let root = MacroParent {
                id: op.id(),
                ty: Rc::clone(ty),
            };
            let mut builder = MacroBuilder::new(self, root);
            builder.expand(ty, properties);
            op.macro_ops = builder.finish();
        }
        op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{OperatorResult, OperatorTypeFlags};
    use crate::reports::{ReportFlags, ReportKind, shared_reports};

    fn leaf(idname: &str) -> OperatorType {
        OperatorType::new(idname).with_exec(|_, _| OperatorResult::FINISHED)
    }

    #[test]
    fn register_and_find() {
        let mut reg = OperatorRegistry::new();
        reg.register(leaf("WM_OT_save")).ok();
        assert!(reg.contains("WM_OT_save"));
        assert_eq!(reg.find("WM_OT_save").map(|t| t.idname.clone()), Some("WM_OT_save".into()));
        assert!(reg.find("WM_OT_nope").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_keeps_original() {
        let mut reg = OperatorRegistry::new();
        reg.register(leaf("A_OT_a").with_name("first")).ok();
        let err = reg.register(leaf("A_OT_a").with_name("second"));
        assert_eq!(err.err(), Some(RegistryError::Duplicate("A_OT_a".into())));
        assert_eq!(reg.find("A_OT_a").map(|t| t.name.clone()), Some("first".into()));
    }

    #[test]
    fn rejects_empty_and_unknown_steps() {
        let mut reg = OperatorRegistry::new();
        assert_eq!(reg.register(leaf("")).err(), Some(RegistryError::EmptyIdname));
        let m = OperatorType::new_macro("M_OT_m").with_step("A_OT_missing");
        assert!(matches!(
            reg.register(m),
            Err(RegistryError::UnknownMacroStep { step, .. }) if step == "A_OT_missing"
        ));
    }

    #[test]
    fn unregister_keeps_live_handles() {
        let mut reg = OperatorRegistry::new();
        let ty = reg.register(leaf("A_OT_a")).ok();
        assert!(reg.unregister("A_OT_a").is_some());
        assert!(!reg.contains("A_OT_a"));
        assert_eq!(ty.map(|t| t.idname.clone()), Some("A_OT_a".into()));
    }

    #[test]
    fn instance_copies_properties_deeply() {
        let mut reg = OperatorRegistry::new();
        let ty = reg
            .register(leaf("A_OT_a").with_property("count", 1).with_property("mode", "x"))
            .ok()
            .unwrap_or_else(|| Rc::new(leaf("A_OT_a")));
        let caller = Properties::new().with("count", 5);
        let mut op = reg.create_instance(&ty, Some(&caller), None);
        assert_eq!(op.properties.get_int("count"), Some(5));
        assert_eq!(op.properties.get_str("mode"), Some("x"));
        op.properties.set("count", 9);
        assert_eq!(caller.get_int("count"), Some(5));
        assert_eq!(ty.properties.get_int("count"), Some(1));
    }

    #[test]
    fn borrowed_and_owned_reports() {
        let mut reg = OperatorRegistry::new();
        let ty = reg.register(leaf("A_OT_a")).ok().unwrap_or_else(|| Rc::new(leaf("A_OT_a")));
        let caller = shared_reports();
        let op = reg.create_instance(&ty, None, Some(Rc::clone(&caller)));
        op.report(ReportKind::Warning, "careful");
        assert_eq!(caller.borrow().len(), 1);
        assert!(!caller.borrow().flag.contains(ReportFlags::FREE));

        let owned = reg.create_instance(&ty, None, None);
        assert!(owned.reports().borrow().flag.contains(ReportFlags::FREE));
    }

    #[test]
    fn macro_flattens_depth_first_under_root() {
        let mut reg = OperatorRegistry::new();
        for id in ["A_OT_a", "B_OT_b", "C_OT_c"] {
            reg.register(leaf(id)).ok();
        }
        reg.register(OperatorType::new_macro("N_OT_inner").with_step("B_OT_b").with_step("C_OT_c"))
            .ok();
        let outer = reg
            .register(
                OperatorType::new_macro("M_OT_outer")
                    .with_flags(OperatorTypeFlags::UNDO)
                    .with_step("A_OT_a")
                    .with_step("N_OT_inner"),
            )
            .ok()
            .unwrap_or_else(|| Rc::new(OperatorType::new_macro("M_OT_outer")));

        let before = reg.instances_created();
        let root = reg.create_instance(&outer, None, None);
        let names: Vec<_> = root.macro_ops().iter().map(Operator::idname).collect();
        assert_eq!(names, ["A_OT_a", "N_OT_inner", "B_OT_b", "C_OT_c"]);
        assert!(root.macro_ops().iter().all(|c| c.opm().map(|p| p.id) == Some(root.id())));
        assert!(root.macro_ops().iter().all(|c| c.macro_ops().is_empty()));
        assert_eq!(reg.instances_created() - before, 5);
    }

    #[test]
    fn macro_step_properties_match_by_position() {
        let mut reg = OperatorRegistry::new();
        reg.register(leaf("A_OT_a").with_property("value", 0)).ok();
        reg.register(leaf("B_OT_b").with_property("value", 0)).ok();
        let m = reg
            .register(
                OperatorType::new_macro("M_OT_m")
                    .with_step("A_OT_a")
                    .with_step_properties("B_OT_b", Properties::new().with("locked", true)),
            )
            .ok()
            .unwrap_or_else(|| Rc::new(OperatorType::new_macro("M_OT_m")));

        let props = Properties::new()
            .with("unrelated", 1)
            .with("A_OT_a", Properties::new().with("value", 1))
            .with("B_OT_b", Properties::new().with("value", 2));
        let root = reg.create_instance(&m, Some(&props), None);
        let values: Vec<_> = root
            .macro_ops()
            .iter()
            .map(|c| c.properties.get_int("value"))
            .collect();
        assert_eq!(values, [Some(1), Some(2)]);
        assert_eq!(root.macro_ops()[1].properties.get_bool("locked"), Some(true));
    }
}
