//! Drift and diff semantics: the planner that decides, attribute by
//! attribute, whether prior state and configuration differ after
//! normalization and suppression, and whether a difference forces
//! replacement.

pub mod suppress;

use std::collections::BTreeSet;

use crate::schema::{AttributeSchema, Kind, ResourceSchema};
use crate::value::{AttrPath, Value};

/// One detected difference at top-level attribute granularity. `old` and
/// `new` carry the full subtrees.
#[derive(Debug, Clone)]
pub struct AttributeChange {
    pub path: AttrPath,
    pub old: Value,
    pub new: Value,
    pub requires_replace: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub changes: Vec<AttributeChange>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn requires_replace(&self) -> bool {
        self.changes.iter().any(|c| c.requires_replace)
    }

    pub fn changed_paths(&self) -> Vec<&AttrPath> {
        self.changes.iter().map(|c| &c.path).collect()
    }
}

/// Compute the plan for one instance. `config` must already have defaults
/// applied; `prior` is the normalized state from the last apply.
pub fn plan(schema: &ResourceSchema, prior: &Value, config: &Value) -> Plan {
    let mut changes = Vec::new();
    let empty = std::collections::BTreeMap::new();
    let prior_entries = prior.as_entries().unwrap_or(&empty);
    let config_entries = config.as_entries().unwrap_or(&empty);

    let names: BTreeSet<&String> = prior_entries.keys().chain(config_entries.keys()).collect();
    for name in names {
        let attr = match schema.attribute(name) {
            Some(attr) => attr,
            // Unknown keys in prior state are server-era leftovers; the
            // static validator already rejected unknown config keys.
            None => continue,
        };
        let path = AttrPath::attr(name.clone());
        let old = prior_entries.get(name.as_str()).filter(|v| !v.is_null());
        let new = config_entries.get(name.as_str()).filter(|v| !v.is_null());

        // Server-owned attributes never diff against configuration.
        if attr.requiredness == crate::schema::Requiredness::Computed {
            continue;
        }
        // Optional+computed left unset: the server filled the prior value,
        // the user expressed no opinion. Not drift.
        if new.is_none() && attr.requiredness.computed() && old.is_some() {
            continue;
        }

        let old_v = old.cloned().unwrap_or(Value::Null);
        let new_v = new.cloned().unwrap_or(Value::Null);
        if let Some(force) = diff_value(attr, &path, &old_v, &new_v, config) {
            let requires_replace = force || !schema.supports_update;
            if requires_replace {
                tracing::debug!(attribute = %path, "change forces replacement");
            }
            changes.push(AttributeChange {
                path,
                old: old_v,
                new: new_v,
                requires_replace,
            });
        }
    }

    Plan { changes }
}

/// Recursive comparison of one attribute. Returns `None` when equal after
/// normalization and suppression, `Some(force)` when changed, where `force`
/// reflects the innermost force-new attribute crossed.
fn diff_value(
    attr: &AttributeSchema,
    path: &AttrPath,
    old: &Value,
    new: &Value,
    config_root: &Value,
) -> Option<bool> {
    let old_n = normalize_value(attr, old.clone());
    let new_n = normalize_value(attr, new.clone());

    if values_equal(&old_n, &new_n) {
        return None;
    }
    if let Some(suppressor) = &attr.suppress_diff {
        // Suppressors define semantic equality; they apply to force-new
        // attributes too (enum aliases must never force replacement). A
        // suppressor masking a genuinely different pair is a bug in that
        // suppressor, not in the planner.
        if suppressor(path, &old_n, &new_n, config_root) {
            tracing::debug!(attribute = %path, "diff suppressed");
            return None;
        }
    }

    match (&attr.kind, old_n.unredacted(), new_n.unredacted()) {
        (Kind::Object(shape), Value::Object(old_m), Value::Object(new_m))
        | (Kind::Object(shape), Value::Map(old_m), Value::Map(new_m)) => {
            let mut changed = false;
            let mut force = attr.force_new;
            let names: BTreeSet<&String> = old_m.keys().chain(new_m.keys()).collect();
            for name in names {
                let child = match shape.get(name.as_str()) {
                    Some(child) => child,
                    None => continue,
                };
                let old_c = old_m.get(name.as_str()).cloned().unwrap_or(Value::Null);
                let new_c = new_m.get(name.as_str()).cloned().unwrap_or(Value::Null);
                if new_c.is_null() && child.requiredness.computed() && !old_c.is_null() {
                    continue;
                }
                if let Some(child_force) =
                    diff_value(child, &path.clone().key(name.clone()), &old_c, &new_c, config_root)
                {
                    changed = true;
                    force = force || child_force;
                }
            }
            changed.then_some(force)
        }
        (Kind::List(el), Value::List(old_items), Value::List(new_items)) => {
            if old_items.len() != new_items.len() {
                return Some(attr.force_new);
            }
            let mut changed = false;
            let mut force = attr.force_new;
            for (i, (o, n)) in old_items.iter().zip(new_items).enumerate() {
                if let Some(child_force) =
                    diff_value(el, &path.clone().index(i), o, n, config_root)
                {
                    changed = true;
                    force = force || child_force;
                }
            }
            changed.then_some(force)
        }
        // Sets changed as a whole (order-insensitive equality already
        // failed above); element identity is not positional.
        _ => Some(attr.force_new),
    }
}

/// Equality with numeric int/float representation tolerance on top of the
/// Value semantics (set order-insensitivity, exact float compare).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.unredacted(), b.unredacted()) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            a.as_float() == b.as_float()
        }
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        // Multiset match with the same element tolerance as everywhere else.
        (Value::Set(xs), Value::Set(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut unmatched: Vec<&Value> = ys.iter().collect();
            xs.iter().all(|x| {
                match unmatched.iter().position(|y| values_equal(x, *y)) {
                    Some(i) => {
                        unmatched.swap_remove(i);
                        true
                    }
                    None => false,
                }
            })
        }
        (Value::Map(xs), Value::Map(ys)) | (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map(|y| values_equal(x, y)).unwrap_or(false))
        }
        _ => a == b,
    }
}

fn normalize_value(attr: &AttributeSchema, value: Value) -> Value {
    let value = match &attr.state_normalize {
        Some(f) if !value.is_null() => f(value),
        _ => value,
    };
    match (&attr.kind, value) {
        (Kind::List(el), Value::List(items)) => {
            Value::List(items.into_iter().map(|v| normalize_value(el, v)).collect())
        }
        (Kind::Set(el), Value::Set(items)) | (Kind::Set(el), Value::List(items)) => {
            Value::Set(items.into_iter().map(|v| normalize_value(el, v)).collect())
        }
        (Kind::Map(el), Value::Map(m)) | (Kind::Map(el), Value::Object(m)) => Value::Map(
            m.into_iter().map(|(k, v)| (k, normalize_value(el, v))).collect(),
        ),
        (Kind::Object(shape), Value::Object(m)) | (Kind::Object(shape), Value::Map(m)) => {
            Value::Object(
                m.into_iter()
                    .map(|(k, v)| match shape.get(&k) {
                        Some(child) => {
                            let v = normalize_value(child, v);
                            (k, v)
                        }
                        None => (k, v),
                    })
                    .collect(),
            )
        }
        (_, value) => value,
    }
}

/// Apply every `state_normalize` hook before a value tree enters prior
/// state, so that semantically-equal representations compare equal across
/// runs.
pub fn normalize_state(schema: &ResourceSchema, state: Value) -> Value {
    let entries = match state {
        Value::Object(m) | Value::Map(m) => m,
        other => return other,
    };
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| match schema.attribute(&k) {
                Some(attr) => {
                    let v = normalize_value(attr, v);
                    (k, v)
                }
                None => (k, v),
            })
            .collect(),
    )
}
