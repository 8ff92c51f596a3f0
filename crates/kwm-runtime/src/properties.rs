#![forbid(unsafe_code)]

//! Operator property bag.
//!
//! Operators read and write their parameters through [`Properties`], a
//! name-keyed bag of [`PropertyValue`]s. The bag is the only view the window
//! manager has of the scene data model; copying an operator's properties is
//! a plain deep [`Clone`].
//!
//! Entries keep insertion order. Macro expansion walks a macro's bag in that
//! order and matches nested [`PropertyValue::Group`]s to steps by position.

/// A single property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    FloatArray(Vec<f64>),
    /// Nested bag, used for per-step macro properties.
    Group(Properties),
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<f64>> for PropertyValue {
    fn from(v: Vec<f64>) -> Self {
        Self::FloatArray(v)
    }
}

impl From<Properties> for PropertyValue {
    fn from(v: Properties) -> Self {
        Self::Group(v)
    }
}

/// Name-keyed property bag in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: Vec<(String, PropertyValue)>,
}

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Replace the value of `name` in place, or append a new entry.
    pub fn set(&mut self, name: &str, value: impl Into<PropertyValue>) {
        let value = value.into();
        match self.position(name) {
            Some(idx) => self.values[idx].1 = value,
            None => self.values.push((name.to_owned(), value)),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.values.iter().position(|(k, _)| k == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let idx = self.position(name)?;
        Some(self.values.remove(idx).1)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn get_group(&self, name: &str) -> Option<&Properties> {
        match self.get(name)? {
            PropertyValue::Group(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value; integer properties are widened.
    #[must_use]
    pub fn get_float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Overwrite entries with every entry of `other`.
    pub fn merge_from(&mut self, other: &Self) {
        for (k, v) in &other.values {
            self.set(k, v.clone());
        }
    }

    /// True when every entry of `subset` is present here with an equal value.
    #[must_use]
    pub fn contains_all(&self, subset: &Self) -> bool {
        subset
            .values
            .iter()
            .all(|(k, v)| self.get(k) == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let p = Properties::new()
            .with("extend", true)
            .with("count", 3)
            .with("factor", 0.5)
            .with("mode", "add");
        assert_eq!(p.get_bool("extend"), Some(true));
        assert_eq!(p.get_int("count"), Some(3));
        assert_eq!(p.get_float("count"), Some(3.0));
        assert_eq!(p.get_float("factor"), Some(0.5));
        assert_eq!(p.get_str("mode"), Some("add"));
        assert_eq!(p.get_int("mode"), None);
        assert_eq!(p.get_bool("missing"), None);
    }

    #[test]
    fn clone_is_deep() {
        let a = Properties::new().with("offset", vec![1.0, 2.0]);
        let mut b = a.clone();
        b.set("offset", vec![9.0]);
        assert_eq!(a.get("offset"), Some(&PropertyValue::FloatArray(vec![1.0, 2.0])));
    }

    #[test]
    fn merge_overrides() {
        let mut base = Properties::new().with("a", 1).with("b", 2);
        base.merge_from(&Properties::new().with("b", 20).with("c", 30));
        assert_eq!(base.get_int("a"), Some(1));
        assert_eq!(base.get_int("b"), Some(20));
        assert_eq!(base.get_int("c"), Some(30));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn keeps_insertion_order() {
        let mut p = Properties::new().with("zeta", 1).with("alpha", 2);
        p.set("zeta", 10);
        let names: Vec<_> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(p.remove("zeta"), Some(PropertyValue::Int(10)));
        assert!(!p.contains("zeta"));
    }

    #[test]
    fn nested_groups() {
        let step = Properties::new().with("value", 2.0);
        let p = Properties::new().with("TRANSFORM_OT_translate", step.clone());
        assert_eq!(p.get_group("TRANSFORM_OT_translate"), Some(&step));
        assert_eq!(p.get_group("missing"), None);
    }

    #[test]
    fn subset_check() {
        let full = Properties::new().with("a", 1).with("b", true);
        assert!(full.contains_all(&Properties::new()));
        assert!(full.contains_all(&Properties::new().with("b", true)));
        assert!(!full.contains_all(&Properties::new().with("b", false)));
        assert!(!full.contains_all(&Properties::new().with("z", 1)));
    }
}
