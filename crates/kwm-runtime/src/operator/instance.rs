#![forbid(unsafe_code)]

//! Operator instances and macro flattening.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::{OperatorFlags, OperatorRegistry, OperatorType};
use crate::properties::{Properties, PropertyValue};
use crate::reports::{ReportFlags, ReportKind, SharedReports, shared_reports};

/// Process-unique instance id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(pub u64);

/// Back-reference from a macro child to the root instance.
#[derive(Debug, Clone)]
pub struct MacroParent {
    pub id: OperatorId,
    pub ty: Rc<OperatorType>,
}

/// Progress of a macro root through its children.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MacroState {
    /// Child currently running modal.
    pub(crate) active: Option<usize>,
    pub(crate) any_finished: bool,
}

/// A live operator instance.
pub struct Operator {
    id: OperatorId,
    ty: Rc<OperatorType>,
    pub properties: Properties,
    reports: SharedReports,
    pub flag: OperatorFlags,
    opm: Option<MacroParent>,
    pub(crate) macro_ops: Vec<Operator>,
    pub(crate) macro_state: MacroState,
    /// Scratch state owned by the operator's own callbacks.
    pub customdata: Option<Box<dyn Any>>,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("id", &self.id)
            .field("idname", &self.ty.idname)
            .field("properties", &self.properties)
            .field("flag", &self.flag)
            .field("opm", &self.opm.as_ref().map(|p| p.id))
            .field("macro_ops", &self.macro_ops)
            .finish_non_exhaustive()
    }
}

impl Operator {
    pub(crate) fn new(
        id: OperatorId,
        ty: Rc<OperatorType>,
        properties: Properties,
        reports: Option<SharedReports>,
    ) -> Self {
        let reports = reports.unwrap_or_else(|| {
            let owned = shared_reports();
            owned.borrow_mut().flag |= ReportFlags::FREE;
            owned
        });
        Self {
            id,
            ty,
            properties,
            reports,
            flag: OperatorFlags::empty(),
            opm: None,
            macro_ops: Vec::new(),
            macro_state: MacroState::default(),
            customdata: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> OperatorId {
        self.id
    }

    #[must_use]
    pub fn ty(&self) -> &Rc<OperatorType> {
        &self.ty
    }

    #[must_use]
    pub fn idname(&self) -> &str {
        &self.ty.idname
    }

    #[must_use]
    pub fn reports(&self) -> &SharedReports {
        &self.reports
    }

    pub fn report(&self, kind: ReportKind, message: impl Into<String>) {
        self.reports.borrow_mut().report(kind, message);
    }

    /// The macro root this instance belongs to, if it is a macro child.
    #[must_use]
    pub fn opm(&self) -> Option<&MacroParent> {
        self.opm.as_ref()
    }

    /// Flattened macro children, in execution order.
    #[must_use]
    pub fn macro_ops(&self) -> &[Operator] {
        &self.macro_ops
    }

    /// Index of the child currently running modal.
    #[must_use]
    pub fn active_step(&self) -> Option<usize> {
        self.macro_state.active
    }

    /// Type whose flags govern cursor grabbing: the macro root's when this
    /// is a child.
    #[must_use]
    pub fn grab_type(&self) -> &OperatorType {
        self.opm.as_ref().map_or(&self.ty, |p| &p.ty)
    }
}

// ---------------------------------------------------------------------------
// Macro flattening
// ---------------------------------------------------------------------------

/// Flattens a macro type's steps into one child list under a fixed root.
pub(crate) struct MacroBuilder<'r> {
    registry: &'r OperatorRegistry,
    root: MacroParent,
    flat: Vec<Operator>,
}

impl<'r> MacroBuilder<'r> {
    pub(crate) fn new(registry: &'r OperatorRegistry, root: MacroParent) -> Self {
        Self {
            registry,
            root,
            flat: Vec::new(),
        }
    }

    /// Expand every step of `ty`, depth-first.
    ///
    /// A bag holding nested groups selects positional matching: walking the
    /// bag in order, a group named after the next unmatched step supplies
    /// that step's values and every other entry is skipped. Otherwise every
    /// step is created from its own overrides.
    pub(crate) fn expand(&mut self, ty: &OperatorType, properties: Option<&Properties>) {
        let positional = properties
            .is_some_and(|p| p.iter().any(|(_, v)| matches!(v, PropertyValue::Group(_))));
        match properties {
            Some(props) if positional => {
                let mut steps = ty.macro_steps.iter().peekable();
                for (name, value) in props.iter() {
                    let Some(step) = steps.peek() else {
                        break;
                    };
                    if name != step.idname {
                        continue;
                    }
                    let mut values = match value {
                        PropertyValue::Group(group) => group.clone(),
                        _ => Properties::new(),
                    };
                    values.merge_from(&step.properties);
                    self.add_step(&step.idname, &values);
                    steps.next();
                }
            }
            _ => {
                for step in &ty.macro_steps {
                    self.add_step(&step.idname, &step.properties);
                }
            }
        }
    }

    fn add_step(&mut self, idname: &str, overrides: &Properties) {
        let Some(step_ty) = self.registry.lookup(idname) else {
            tracing::warn!(target: "kwm.operator", macro_idname = %self.root.ty.idname, step = %idname, "macro step is not registered");
            return;
        };
        let mut values = step_ty.properties.clone();
        values.merge_from(overrides);
        let mut child = Operator::new(
            self.registry.next_instance_id(),
            Rc::clone(&step_ty),
            values.clone(),
            None,
        );
        child.opm = Some(self.root.clone());
        self.flat.push(child);
        if step_ty.is_macro() {
            self.expand(&step_ty, Some(&values));
        }
    }

    pub(crate) fn finish(self) -> Vec<Operator> {
        self.flat
    }
}
