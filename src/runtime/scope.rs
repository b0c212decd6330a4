//! Lexical scopes for macro parameters.
//!
//! Scopes are immutable once built and shared through `Arc`, so a callable
//! can keep the scope it was defined in alive for as long as it exists.

use std::sync::Arc;

use im::HashMap;

use crate::runtime::value::Value;

#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// The empty outermost scope.
    pub fn root() -> Arc<Scope> {
        Arc::new(Scope::default())
    }

    pub fn child(parent: &Arc<Scope>, vars: HashMap<String, Value>) -> Arc<Scope> {
        Arc::new(Scope {
            vars,
            parent: Some(Arc::clone(parent)),
        })
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.vars.get(name) {
                return Some(value);
            }
            scope = scope.parent.as_deref()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_bindings_shadow_outer() {
        let outer = Scope::child(
            &Scope::root(),
            HashMap::unit("a".to_string(), Value::from("outer")),
        );
        let inner = Scope::child(&outer, HashMap::unit("a".to_string(), Value::from("inner")));
        assert_eq!(inner.lookup("a"), Some(&Value::from("inner")));
        assert_eq!(outer.lookup("a"), Some(&Value::from("outer")));
        assert_eq!(inner.lookup("b"), None);
    }
}
