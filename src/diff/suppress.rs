//! Built-in diff suppressors reproducing the remote platform's known
//! normalization quirks. Each returns a closure suitable for
//! `AttributeSchema::suppress`.

use crate::value::{AttrPath, Value};

/// Numbers round-tripped through the API can come back as int or float, and
/// string-typed numeric fields as `"1"` vs `"1.0"`. Parse both sides as f64
/// and compare exactly after the parse; unparseable sides mean no
/// suppression.
pub fn float_int(_path: &AttrPath, old: &Value, new: &Value, _config: &Value) -> bool {
    match (parse_numeric(old), parse_numeric(new)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn parse_numeric(value: &Value) -> Option<f64> {
    match value.unredacted() {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Treats every pair drawn from the same alias class as equal. The server
/// normalizes some enums to a preferred spelling; replacement must never be
/// forced across the alias boundary.
pub fn enum_alias(
    classes: &'static [&'static [&'static str]],
) -> impl Fn(&AttrPath, &Value, &Value, &Value) -> bool + Send + Sync {
    move |_path, old, new, _config| {
        let (old, new) = match (old.as_str(), new.as_str()) {
            (Some(o), Some(n)) => (o, n),
            _ => return false,
        };
        if old == new {
            return true;
        }
        classes
            .iter()
            .any(|class| class.contains(&old) && class.contains(&new))
    }
}

/// JSON-blob attributes where the server injects computed metadata keys.
/// Parse both sides, delete the server-owned keys at the top level, and
/// deep-compare the rest.
pub fn json_blob(
    server_owned_keys: &'static [&'static str],
) -> impl Fn(&AttrPath, &Value, &Value, &Value) -> bool + Send + Sync {
    move |_path, old, new, _config| {
        let (old, new) = match (old.as_str(), new.as_str()) {
            (Some(o), Some(n)) => (o, n),
            _ => return false,
        };
        let parse = |s: &str| -> Option<serde_json::Value> { serde_json::from_str(s).ok() };
        match (parse(old), parse(new)) {
            (Some(mut a), Some(mut b)) => {
                for key in server_owned_keys {
                    if let Some(obj) = a.as_object_mut() {
                        obj.remove(*key);
                    }
                    if let Some(obj) = b.as_object_mut() {
                        obj.remove(*key);
                    }
                }
                a == b
            }
            _ => false,
        }
    }
}

/// Ignore diffs on a dependent field while a boolean gate attribute in the
/// configuration is false or unset.
pub fn unless_gate(
    gate: &'static str,
) -> impl Fn(&AttrPath, &Value, &Value, &Value) -> bool + Send + Sync {
    move |_path, _old, _new, config| {
        let enabled = config
            .get(&AttrPath::attr(gate))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        !enabled
    }
}

/// Sensitive material the server never returns: the configured value is
/// canonical, so a prior-state absence is not drift.
pub fn never_returned(_path: &AttrPath, old: &Value, _new: &Value, _config: &Value) -> bool {
    old.is_null()
}

/// Attributes that are never sent to the backend (client-side switches)
/// never generate a diff.
pub fn always(_path: &AttrPath, _old: &Value, _new: &Value, _config: &Value) -> bool {
    true
}
