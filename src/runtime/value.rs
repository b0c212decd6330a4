//! Runtime values.

use std::fmt;
use std::sync::Arc;

use im::HashMap;

use crate::compiler::{Instr, MacroDef};
use crate::runtime::scope::Scope;

#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Missing variables and members. Renders as nothing.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    Callable(Arc<Callable>),
    Namespace(Namespace),
}

/// A macro or a `call` block, closed over the scope it was defined in.
#[derive(Debug)]
pub struct Callable {
    pub kind: CallableKind,
    pub captured: Arc<Scope>,
}

#[derive(Debug)]
pub enum CallableKind {
    Macro(Arc<MacroDef>),
    /// A `call` block body. `outer` is the `caller` that was in effect when
    /// the block started; the body sees that one, not itself.
    Caller {
        body: Arc<Vec<Instr>>,
        outer: Option<Value>,
    },
}

/// The value an `import` binds: macros as members plus the imported file's
/// markup as its display body.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    pub members: HashMap<String, Value>,
    pub display: Option<Arc<DisplayBody>>,
}

#[derive(Debug)]
pub struct DisplayBody {
    pub body: Arc<Vec<Instr>>,
    pub scope: Arc<Scope>,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "none",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Callable(_) => "macro",
            Value::Namespace(_) => "namespace",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Output of safe callables is not escaped again.
    pub fn is_safe(&self) -> bool {
        match self {
            Value::Callable(callable) => match &callable.kind {
                CallableKind::Macro(def) => def.safe,
                CallableKind::Caller { .. } => true,
            },
            _ => false,
        }
    }

    /// `value.name`. Anything without that member yields `Undefined`.
    pub fn member(&self, name: &str) -> Value {
        match self {
            Value::Map(map) => map.get(name).cloned().unwrap_or_default(),
            Value::Namespace(ns) => ns.members.get(name).cloned().unwrap_or_default(),
            Value::List(items) if name == "length" => Value::Number(items.len() as f64),
            Value::String(s) if name == "length" => Value::Number(s.chars().count() as f64),
            _ => Value::Undefined,
        }
    }

    /// `value[index]`
    pub fn index(&self, index: &Value) -> Value {
        match (self, index) {
            (Value::List(items), Value::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => {
                items.get(*n as usize).cloned().unwrap_or_default()
            }
            (_, Value::String(key)) => self.member(key),
            _ => Value::Undefined,
        }
    }

    /// Converts to JSON. Callables, namespaces and `Undefined` have no JSON
    /// form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Undefined | Value::Callable(_) | Value::Namespace(_) => {
                serde_json::Value::Null
            }
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                serde_json::Value::Object(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect(),
                )
            }
        }
    }
}

/// Text form used for output. Namespaces with a display body are rendered
/// by the renderer, not here.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined | Value::Null | Value::Callable(_) | Value::Namespace(_) => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => Arc::ptr_eq(a, b),
            (Value::Namespace(a), Value::Namespace(b)) => a.members == b.members,
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_keeps_structure() {
        let json = serde_json::json!({"user": {"name": "Ann", "tags": ["a", "b"]}, "n": 3});
        let value = Value::from(json.clone());
        assert_eq!(value.member("user").member("name"), Value::from("Ann"));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Undefined.to_string(), "");
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::Number(1.0)]).to_string(),
            "a,1"
        );
    }

    #[test]
    fn missing_members_and_indexes_are_undefined() {
        let list = Value::List(vec![Value::from("x")]);
        assert!(list.index(&Value::Number(4.0)).is_undefined());
        assert_eq!(list.index(&Value::Number(0.0)), Value::from("x"));
        assert!(Value::Null.member("a").is_undefined());
    }
}
