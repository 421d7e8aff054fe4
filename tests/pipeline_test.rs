mod common;

use common::{engine, FakeDatadog};
use datadog_provider::engine::PlannedAction;
use datadog_provider::provider::Provider;
use datadog_provider::value::Value;

fn pipeline_config() -> Value {
    Value::object([
        ("name", Value::string("app logs")),
        ("is_enabled", Value::Bool(true)),
        (
            "filter",
            Value::object([("query", Value::string("source:app"))]),
        ),
        (
            "processor",
            Value::List(vec![
                Value::object([(
                    "grok_parser",
                    Value::object([
                        ("source", Value::string("message")),
                        (
                            "grok",
                            Value::object([
                                ("support_rules", Value::string("")),
                                (
                                    "match_rules",
                                    Value::string("rule %{word:user} connected"),
                                ),
                            ]),
                        ),
                    ]),
                )]),
                Value::object([(
                    "pipeline",
                    Value::object([
                        ("name", Value::string("nginx")),
                        (
                            "filter",
                            Value::object([("query", Value::string("service:nginx"))]),
                        ),
                        (
                            "processor",
                            Value::List(vec![Value::object([(
                                "status_remapper",
                                Value::object([(
                                    "sources",
                                    Value::List(vec![Value::string("level")]),
                                )]),
                            )])]),
                        ),
                    ]),
                )]),
                Value::object([(
                    "date_remapper",
                    Value::object([(
                        "sources",
                        Value::List(vec![Value::string("ts"), Value::string("timestamp")]),
                    )]),
                )]),
            ]),
        ),
    ])
}

#[tokio::test]
async fn nested_pipeline_survives_a_full_round_trip() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let pipeline = provider.resource("datadog_logs_custom_pipeline").unwrap();

    let config = pipeline_config();
    let (state, diags) = eng.create(pipeline.as_ref(), &config).await;
    assert!(!diags.has_errors(), "{diags:?}");
    let state = state.unwrap();
    assert!(state.id.starts_with("pipe-"));

    // The stored wire form uses hyphenated tags and keeps order.
    let stored = fake.pipeline(&state.id).unwrap();
    let kinds: Vec<&str> = stored["processors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["grok-parser", "pipeline", "date-remapper"]);
    assert_eq!(
        stored["processors"][1]["processors"][0]["type"],
        "status-remapper"
    );

    let (refreshed, diags) = eng.refresh(pipeline.as_ref(), &state, &config).await;
    assert!(!diags.has_errors(), "{diags:?}");
    let refreshed = refreshed.unwrap();

    let plan = eng.plan(pipeline.as_ref(), Some(&refreshed), &config);
    assert_eq!(plan.action, PlannedAction::NoOp, "{:?}", plan.diff);
}

#[tokio::test]
async fn reordering_processors_plans_an_update() {
    let fake = FakeDatadog::new();
    let eng = engine(fake);
    let provider = Provider::new().unwrap();
    let pipeline = provider.resource("datadog_logs_custom_pipeline").unwrap();

    let config = pipeline_config();
    let (state, _) = eng.create(pipeline.as_ref(), &config).await;
    let state = state.unwrap();

    let mut reordered = config.clone();
    if let Value::Object(fields) = &mut reordered {
        if let Some(Value::List(processors)) = fields.get_mut("processor") {
            processors.swap(0, 2);
        }
    }
    let plan = eng.plan(pipeline.as_ref(), Some(&state), &reordered);
    assert_eq!(plan.action, PlannedAction::Update);
}

#[tokio::test]
async fn stale_pipeline_ids_answer_400_and_are_treated_as_gone() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let pipeline = provider.resource("datadog_logs_custom_pipeline").unwrap();

    let config = pipeline_config();
    let (state, _) = eng.create(pipeline.as_ref(), &config).await;
    let state = state.unwrap();

    let diags = eng.delete(pipeline.as_ref(), &state).await;
    assert!(!diags.has_errors(), "{diags:?}");

    // This API answers 400, not 404, for an unknown pipeline ID.
    let (refreshed, diags) = eng.refresh(pipeline.as_ref(), &state, &config).await;
    assert!(!diags.has_errors(), "{diags:?}");
    assert!(refreshed.is_none());

    let diags = eng.delete(pipeline.as_ref(), &state).await;
    assert!(!diags.has_errors(), "{diags:?}");
}

#[tokio::test]
async fn a_processor_with_two_variant_keys_fails_validation() {
    let fake = FakeDatadog::new();
    let eng = engine(fake);
    let provider = Provider::new().unwrap();
    let pipeline = provider.resource("datadog_logs_custom_pipeline").unwrap();

    let config = Value::object([
        ("name", Value::string("bad")),
        (
            "filter",
            Value::object([("query", Value::string("*"))]),
        ),
        (
            "processor",
            Value::List(vec![Value::object([
                (
                    "date_remapper",
                    Value::object([("sources", Value::List(vec![Value::string("ts")]))]),
                ),
                (
                    "status_remapper",
                    Value::object([("sources", Value::List(vec![Value::string("level")]))]),
                ),
            ])]),
        ),
    ]);
    assert!(eng.validate(pipeline.as_ref(), &config).has_errors());
}
