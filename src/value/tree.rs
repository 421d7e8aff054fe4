use std::collections::BTreeMap;
use std::fmt;

use serde_json::Number;
use thiserror::Error;

use super::path::{AttrPath, PathStep};

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("path '{0}' does not exist")]
    NoSuchPath(AttrPath),
    #[error("cannot index '{kind}' value with step '{step}'")]
    WrongKind { kind: &'static str, step: PathStep },
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// The dynamic value exchanged between the host runtime and resource
/// adapters. Collections are homogeneous by convention but the type does
/// not enforce it; adapters narrow to typed payload structs at their
/// boundaries.
///
/// `Set` equality is order-insensitive; `List` preserves index. `Sensitive`
/// wraps a value that must never appear in human-readable output — it is
/// transparent for equality and comparison, opaque for `Display`/`Debug`.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(BTreeMap<String, Value>),
    Sensitive(Box<Value>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Sensitive(inner) => inner.kind_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.unredacted(), Value::Null)
    }

    /// Strip any `Sensitive` wrapper. The result still owns sensitive data;
    /// callers must not log it.
    pub fn unredacted(&self) -> &Value {
        match self {
            Value::Sensitive(inner) => inner.unredacted(),
            other => other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.unredacted() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.unredacted() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.unredacted() {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view tolerating int/float representation drift.
    pub fn as_float(&self) -> Option<f64> {
        match self.unredacted() {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_items(&self) -> Option<&[Value]> {
        match self.unredacted() {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_entries(&self) -> Option<&BTreeMap<String, Value>> {
        match self.unredacted() {
            Value::Map(m) | Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn expect_str(&self) -> Result<&str, ValueError> {
        self.as_str().ok_or(ValueError::TypeMismatch {
            expected: "string",
            actual: self.kind_name(),
        })
    }

    /// Navigate to a descendant. Returns `None` when any step is missing.
    pub fn get(&self, path: &AttrPath) -> Option<&Value> {
        let mut current = self.unredacted();
        for step in path.steps() {
            current = match (current, step) {
                (Value::Map(m) | Value::Object(m), PathStep::Key(k)) => m.get(k)?.unredacted(),
                (Value::List(items) | Value::Set(items), PathStep::Index(i)) => {
                    items.get(*i)?.unredacted()
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write a descendant, materializing intermediate objects and extending
    /// lists as needed. The root must already be (or become) a container
    /// matching the first step.
    pub fn set(&mut self, path: &AttrPath, value: Value) -> Result<(), ValueError> {
        let mut current = self;
        let steps = path.steps();
        for (i, step) in steps.iter().enumerate() {
            let last = i + 1 == steps.len();
            if let Value::Sensitive(inner) = current {
                current = inner.as_mut();
            }
            if current.is_null() {
                *current = match step {
                    PathStep::Key(_) => Value::Object(BTreeMap::new()),
                    PathStep::Index(_) => Value::List(Vec::new()),
                };
            }
            match (current, step) {
                (Value::Map(m) | Value::Object(m), PathStep::Key(k)) => {
                    let slot = m.entry(k.clone()).or_insert(Value::Null);
                    if last {
                        *slot = value;
                        return Ok(());
                    }
                    current = slot;
                }
                (Value::List(items) | Value::Set(items), PathStep::Index(idx)) => {
                    while items.len() <= *idx {
                        items.push(Value::Null);
                    }
                    if last {
                        items[*idx] = value;
                        return Ok(());
                    }
                    current = &mut items[*idx];
                }
                (other, step) => {
                    return Err(ValueError::WrongKind {
                        kind: other.kind_name(),
                        step: step.clone(),
                    })
                }
            }
        }
        // Empty path replaces the root.
        *current = value;
        Ok(())
    }

    /// True if any leaf under this value is sensitive.
    pub fn contains_sensitive(&self) -> bool {
        match self {
            Value::Sensitive(_) => true,
            Value::List(items) | Value::Set(items) => items.iter().any(Value::contains_sensitive),
            Value::Map(m) | Value::Object(m) => m.values().any(Value::contains_sensitive),
            _ => false,
        }
    }

    /// Lossy conversion into JSON for wire payloads and state snapshots.
    /// Sensitive wrappers are stripped; the schema governs redaction.
    pub fn to_json(&self) -> serde_json::Value {
        match self.unredacted() {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(m) | Value::Object(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Sensitive(_) => unreachable!("unredacted strips Sensitive"),
        }
    }

    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(m) => Value::Object(
                m.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect(),
            ),
        }
    }

    pub fn object(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
        Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.unredacted(), other.unredacted()) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // Sets compare modulo order: every element of each side must
            // appear in the other, with multiplicity.
            (Value::Set(a), Value::Set(b)) => set_eq(a, b),
            (Value::Map(a), Value::Map(b)) | (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

fn set_eq(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut remaining: Vec<&Value> = b.iter().collect();
    for item in a {
        match remaining.iter().position(|candidate| *candidate == item) {
            Some(pos) => {
                remaining.swap_remove(pos);
            }
            None => return false,
        }
    }
    true
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Set(items) => {
                write!(f, "set")?;
                f.debug_list().entries(items).finish()
            }
            Value::Map(m) | Value::Object(m) => f.debug_map().entries(m.iter()).finish(),
            Value::Sensitive(_) => write!(f, "(sensitive)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Sensitive(_) => write!(f, "(sensitive)"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttrPath;

    #[test]
    fn set_equality_ignores_order() {
        let a = Value::Set(vec![Value::string("x"), Value::string("y")]);
        let b = Value::Set(vec![Value::string("y"), Value::string("x")]);
        assert_eq!(a, b);

        let c = Value::Set(vec![Value::string("x"), Value::string("x")]);
        assert_ne!(a, c);
    }

    #[test]
    fn list_equality_preserves_order() {
        let a = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::List(vec![Value::Int(2), Value::Int(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn sensitive_is_transparent_for_equality_but_redacted_in_display() {
        let secret = Value::Sensitive(Box::new(Value::string("hunter2")));
        assert_eq!(secret, Value::string("hunter2"));
        assert_eq!(format!("{secret}"), "(sensitive)");
        assert_eq!(format!("{secret:?}"), "(sensitive)");
    }

    #[test]
    fn nested_get_and_set() {
        let mut root = Value::Null;
        let path: AttrPath = "options.thresholds.critical".parse().unwrap();
        root.set(&path, Value::Float(0.9)).unwrap();
        assert_eq!(root.get(&path), Some(&Value::Float(0.9)));
        assert_eq!(root.get(&"options.missing".parse().unwrap()), None);
    }

    #[test]
    fn set_extends_lists() {
        let mut root = Value::Null;
        root.set(&"items.1".parse().unwrap(), Value::Int(7)).unwrap();
        assert_eq!(
            root.get(&"items".parse().unwrap()),
            Some(&Value::List(vec![Value::Null, Value::Int(7)]))
        );
    }
}
