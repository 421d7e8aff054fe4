//! Static (plan-time, no network) validation of a configured value tree
//! against a resource schema, plus default application.

use std::collections::BTreeMap;

use crate::diag::{Diagnostic, Diagnostics};
use crate::value::{AttrPath, Value};

use super::{AttributeSchema, Kind, Requiredness, ResourceSchema};

/// Validate a configured value tree. Computed fields are allowed to be
/// absent here; a second validation pass after planning lets them stay
/// unknown until apply.
pub fn validate_config(schema: &ResourceSchema, config: &Value) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let entries = match config.as_entries() {
        Some(entries) => entries,
        None => {
            diags.push(Diagnostic::error("configuration must be an object"));
            return diags;
        }
    };

    for (name, attr) in &schema.attributes {
        let path = AttrPath::attr(name.clone());
        let value = entries.get(name).filter(|v| !v.is_null());

        match value {
            None => {
                if attr.requiredness == Requiredness::Required {
                    diags.push(
                        Diagnostic::error(format!("'{name}' is required"))
                            .at(path.clone()),
                    );
                }
            }
            Some(v) => {
                if !attr.requiredness.user_settable() {
                    diags.push(
                        Diagnostic::error(format!("'{name}' is computed and cannot be configured"))
                            .at(path.clone()),
                    );
                    continue;
                }
                if let Some(message) = &attr.deprecated {
                    diags.push(
                        Diagnostic::warning(format!("'{name}' is deprecated"))
                            .with_detail(message.clone())
                            .at(path.clone()),
                    );
                }
                validate_value(attr, v, &path, &mut diags);
                check_cross_field(name, attr, entries, &path, &mut diags);
            }
        }
    }

    for name in entries.keys() {
        if !schema.attributes.contains_key(name) {
            diags.push(
                Diagnostic::error(format!("unknown attribute '{name}'")).at(AttrPath::attr(name)),
            );
        }
    }

    diags
}

fn validate_value(attr: &AttributeSchema, value: &Value, path: &AttrPath, diags: &mut Diagnostics) {
    let value = value.unredacted();
    match (&attr.kind, value) {
        (Kind::String, Value::String(_))
        | (Kind::Int, Value::Int(_))
        | (Kind::Bool, Value::Bool(_))
        | (Kind::Float, Value::Float(_))
        | (Kind::Float, Value::Int(_)) => {}
        (Kind::List(el), Value::List(items)) | (Kind::Set(el), Value::Set(items)) => {
            check_cardinality(attr, items.len(), path, diags);
            for (i, item) in items.iter().enumerate() {
                validate_value(el, item, &path.clone().index(i), diags);
            }
        }
        // Hosts that cannot express set literals hand sets over as lists.
        (Kind::Set(el), Value::List(items)) => {
            check_cardinality(attr, items.len(), path, diags);
            for (i, item) in items.iter().enumerate() {
                validate_value(el, item, &path.clone().index(i), diags);
            }
        }
        (Kind::Map(el), Value::Map(m)) | (Kind::Map(el), Value::Object(m)) => {
            for (k, v) in m {
                validate_value(el, v, &path.clone().key(k.clone()), diags);
            }
        }
        (Kind::Object(shape), Value::Object(m)) | (Kind::Object(shape), Value::Map(m)) => {
            validate_object(shape, m, path, diags);
        }
        (kind, other) => {
            diags.push(
                Diagnostic::error(format!(
                    "expected {}, got {}",
                    kind.name(),
                    other.kind_name()
                ))
                .at(path.clone()),
            );
            return;
        }
    }

    if let Some(validator) = &attr.validator {
        diags.extend(validator(value, path));
    }
}

fn validate_object(
    shape: &BTreeMap<String, AttributeSchema>,
    entries: &BTreeMap<String, Value>,
    path: &AttrPath,
    diags: &mut Diagnostics,
) {
    for (name, attr) in shape {
        let child_path = path.clone().key(name.clone());
        match entries.get(name).filter(|v| !v.is_null()) {
            None => {
                if attr.requiredness == Requiredness::Required {
                    diags.push(
                        Diagnostic::error(format!("'{name}' is required")).at(child_path),
                    );
                }
            }
            Some(v) => validate_value(attr, v, &child_path, diags),
        }
    }
    for name in entries.keys() {
        if !shape.contains_key(name) {
            diags.push(
                Diagnostic::error(format!("unknown attribute '{name}'"))
                    .at(path.clone().key(name.clone())),
            );
        }
    }
}

fn check_cardinality(
    attr: &AttributeSchema,
    len: usize,
    path: &AttrPath,
    diags: &mut Diagnostics,
) {
    if let Some(min) = attr.min_items {
        if len < min {
            diags.push(
                Diagnostic::error(format!("at least {min} item(s) required, got {len}"))
                    .at(path.clone()),
            );
        }
    }
    if let Some(max) = attr.max_items {
        if len > max {
            diags.push(
                Diagnostic::error(format!("at most {max} item(s) allowed, got {len}"))
                    .at(path.clone()),
            );
        }
    }
}

fn check_cross_field(
    name: &str,
    attr: &AttributeSchema,
    entries: &BTreeMap<String, Value>,
    path: &AttrPath,
    diags: &mut Diagnostics,
) {
    let is_set = |candidate: &str| {
        entries
            .get(candidate)
            .map(|v| !v.is_null())
            .unwrap_or(false)
    };

    for other in &attr.conflicts_with {
        if is_set(other) {
            diags.push(
                Diagnostic::error(format!("'{name}' conflicts with '{other}'")).at(path.clone()),
            );
        }
    }

    if !attr.exactly_one_of.is_empty() {
        let set_count = attr.exactly_one_of.iter().filter(|p| is_set(p)).count();
        if set_count != 1 {
            diags.push(
                Diagnostic::error(format!(
                    "exactly one of [{}] must be set, found {set_count}",
                    attr.exactly_one_of.join(", ")
                ))
                .at(path.clone()),
            );
        }
    }

    if !attr.at_least_one_of.is_empty() && !attr.at_least_one_of.iter().any(|p| is_set(p)) {
        diags.push(
            Diagnostic::error(format!(
                "at least one of [{}] must be set",
                attr.at_least_one_of.join(", ")
            ))
            .at(path.clone()),
        );
    }
}

/// Fill in defaults for attributes the user did not set. Defaults are never
/// applied retroactively to prior state, and an attribute whose
/// `conflicts_with` partner was explicitly configured keeps no default (the
/// default would conflict with the user's actual choice).
pub fn apply_defaults(schema: &ResourceSchema, config: &Value) -> Value {
    let mut entries = config
        .as_entries()
        .cloned()
        .unwrap_or_default();
    let explicit: std::collections::BTreeSet<String> = entries
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, _)| k.clone())
        .collect();
    for (name, attr) in &schema.attributes {
        let unset = entries.get(name).map(Value::is_null).unwrap_or(true);
        let conflicted = attr
            .conflicts_with
            .iter()
            .any(|other| explicit.contains(other));
        if unset && !conflicted {
            if let Some(default) = &attr.default {
                entries.insert(name.clone(), default.produce());
            }
        }
    }
    Value::Object(entries)
}
