//! The ambient rendering context.
//!
//! Backed by a persistent map: taking a snapshot before a macro call is a
//! pointer copy, and restoring merges the snapshot back over whatever the
//! call added.

use std::mem;

use im::HashMap;

use crate::runtime::value::Value;
use crate::{err_msg, TempletError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self, TempletError> {
        match Value::from(json) {
            Value::Map(entries) => Ok(Self { entries }),
            other => Err(err_msg!(
                Render,
                "Render data must be a JSON object, got {}",
                other.type_name()
            )),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    /// Builder form of [`Context::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Puts every key of `snapshot` back to its snapshot value. Keys added
    /// since the snapshot was taken are kept.
    pub fn restore(&mut self, snapshot: Context) {
        let current = mem::take(&mut self.entries);
        self.entries = snapshot.entries.union(current);
    }
}

impl From<HashMap<String, Value>> for Context {
    fn from(entries: HashMap<String, Value>) -> Self {
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_prefers_snapshot_and_keeps_new_keys() {
        let mut context = Context::new().with("title", "Home");
        let snapshot = context.clone();
        context.insert("title", "clobbered");
        context.insert("added", "kept");
        context.remove("title");
        context.restore(snapshot);
        assert_eq!(context.get("title"), Some(&Value::from("Home")));
        assert_eq!(context.get("added"), Some(&Value::from("kept")));
    }

    #[test]
    fn from_json_requires_an_object() {
        assert!(Context::from_json(serde_json::json!([1, 2])).is_err());
        let context = Context::from_json(serde_json::json!({"a": 1})).unwrap();
        assert_eq!(context.get("a"), Some(&Value::Number(1.0)));
    }
}
