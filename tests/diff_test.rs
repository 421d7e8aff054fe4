use datadog_provider::diff::{normalize_state, plan, suppress};
use datadog_provider::schema::{AttributeSchema, ResourceSchema};
use datadog_provider::value::Value;

const TYPE_ALIASES: &[&[&str]] = &[&["metric alert", "query alert"]];

fn trim(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

fn schema() -> ResourceSchema {
    ResourceSchema::new([
        ("name", AttributeSchema::string().required().normalize(trim)),
        (
            "type",
            AttributeSchema::string()
                .required()
                .force_new()
                .suppress(suppress::enum_alias(TYPE_ALIASES)),
        ),
        ("notify_no_data", AttributeSchema::bool()),
        (
            "no_data_timeframe",
            AttributeSchema::int().suppress(suppress::unless_gate("notify_no_data")),
        ),
        (
            "options",
            AttributeSchema::object([
                ("timeout_h", AttributeSchema::int()),
                ("renotify_interval", AttributeSchema::int()),
            ]),
        ),
    ])
}

#[test]
fn alias_drift_never_forces_replacement() {
    let prior = Value::object([("type", Value::string("query alert"))]);
    let config = Value::object([("type", Value::string("metric alert"))]);
    assert!(plan(&schema(), &prior, &config).is_empty());

    // A genuinely different type still replaces.
    let config = Value::object([("type", Value::string("log alert"))]);
    let p = plan(&schema(), &prior, &config);
    assert!(p.requires_replace());
}

#[test]
fn normalization_runs_before_comparison() {
    let prior = Value::object([("name", Value::string("cpu high"))]);
    let config = Value::object([("name", Value::string("  cpu high  "))]);
    assert!(plan(&schema(), &prior, &config).is_empty());
}

#[test]
fn a_gated_attribute_only_diffs_while_its_gate_is_on() {
    let prior = Value::object([
        ("notify_no_data", Value::Bool(false)),
        ("no_data_timeframe", Value::Int(10)),
    ]);

    let config = Value::object([
        ("notify_no_data", Value::Bool(false)),
        ("no_data_timeframe", Value::Int(30)),
    ]);
    assert!(plan(&schema(), &prior, &config).is_empty());

    let config = Value::object([
        ("notify_no_data", Value::Bool(true)),
        ("no_data_timeframe", Value::Int(30)),
    ]);
    let p = plan(&schema(), &prior, &config);
    // Both the gate flip and the timeframe edit surface.
    assert!(!p.is_empty());
    assert!(!p.requires_replace());
}

#[test]
fn nested_changes_surface_at_attribute_granularity() {
    let prior = Value::object([(
        "options",
        Value::object([
            ("timeout_h", Value::Int(1)),
            ("renotify_interval", Value::Int(10)),
        ]),
    )]);
    let config = Value::object([(
        "options",
        Value::object([
            ("timeout_h", Value::Int(2)),
            ("renotify_interval", Value::Int(10)),
        ]),
    )]);
    let p = plan(&schema(), &prior, &config);
    assert_eq!(p.changes.len(), 1);
    assert_eq!(p.changes[0].path.to_string(), "options");
    assert_eq!(
        p.changes[0].new.get(&"timeout_h".parse().unwrap()),
        Some(&Value::Int(2))
    );
}

#[test]
fn state_normalization_makes_representations_converge() {
    let state = Value::object([
        ("name", Value::string("  cpu high ")),
        ("type", Value::string("query alert")),
    ]);
    let normalized = normalize_state(&schema(), state);
    assert_eq!(
        normalized.get(&"name".parse().unwrap()),
        Some(&Value::string("cpu high"))
    );
}
