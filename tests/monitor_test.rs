mod common;

use common::{engine, FakeDatadog};
use datadog_provider::engine::PlannedAction;
use datadog_provider::provider::Provider;
use datadog_provider::value::Value;

fn monitor_config() -> Value {
    Value::object([
        ("name", Value::string("cpu high")),
        ("type", Value::string("metric alert")),
        (
            "query",
            Value::string("avg(last_5m):avg:system.cpu.user{*} > 0.9"),
        ),
        ("message", Value::string("cpu is high @pagerduty")),
        (
            "monitor_thresholds",
            Value::object([
                ("critical", Value::string("0.9")),
                ("warning", Value::string("1.0")),
            ]),
        ),
        (
            "tags",
            Value::Set(vec![Value::string("team:core"), Value::string("env:prod")]),
        ),
    ])
}

#[tokio::test]
async fn create_then_plan_is_stable_across_server_normalization() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let monitor = provider.resource("datadog_monitor").unwrap();

    let config = monitor_config();
    let (state, diags) = eng.create(monitor.as_ref(), &config).await;
    assert!(!diags.has_errors(), "{diags:?}");
    let state = state.unwrap();
    assert!(!state.id.is_empty());

    // The server answered with "query alert" and numeric thresholds, yet the
    // configuration still says "metric alert" and "1.0".
    let stored = fake.monitor(state.id.parse().unwrap()).unwrap();
    assert_eq!(stored["type"], "query alert");

    let plan = eng.plan(monitor.as_ref(), Some(&state), &config);
    assert_eq!(plan.action, PlannedAction::NoOp, "{:?}", plan.diff);
}

#[tokio::test]
async fn changing_the_monitor_type_forces_replacement() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let monitor = provider.resource("datadog_monitor").unwrap();

    let (state, _) = eng.create(monitor.as_ref(), &monitor_config()).await;
    let state = state.unwrap();

    let mut config = monitor_config();
    config
        .set(&"type".parse().unwrap(), Value::string("log alert"))
        .unwrap();
    let plan = eng.plan(monitor.as_ref(), Some(&state), &config);
    assert_eq!(plan.action, PlannedAction::Replace);
}

#[tokio::test]
async fn no_data_timeframe_only_diffs_while_notify_no_data_is_on() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let monitor = provider.resource("datadog_monitor").unwrap();

    let (state, _) = eng.create(monitor.as_ref(), &monitor_config()).await;
    let state = state.unwrap();

    // Gate off: a timeframe edit is invisible.
    let mut config = monitor_config();
    config
        .set(&"no_data_timeframe".parse().unwrap(), Value::Int(30))
        .unwrap();
    let plan = eng.plan(monitor.as_ref(), Some(&state), &config);
    assert_eq!(plan.action, PlannedAction::NoOp, "{:?}", plan.diff);

    // Gate on: the same edit plans an update.
    config
        .set(&"notify_no_data".parse().unwrap(), Value::Bool(true))
        .unwrap();
    let plan = eng.plan(monitor.as_ref(), Some(&state), &config);
    assert_eq!(plan.action, PlannedAction::Update);
}

#[tokio::test]
async fn removing_a_silenced_scope_calls_unmute() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let monitor = provider.resource("datadog_monitor").unwrap();

    let mut config = monitor_config();
    config
        .set(
            &"silenced".parse().unwrap(),
            Value::Map([("*".to_string(), Value::Int(-1))].into()),
        )
        .unwrap();
    let (state, diags) = eng.create(monitor.as_ref(), &config).await;
    assert!(!diags.has_errors(), "{diags:?}");
    let state = state.unwrap();
    let id: i64 = state.id.parse().unwrap();
    assert!(fake.monitor(id).unwrap()["options"]["silenced"]
        .as_object()
        .unwrap()
        .contains_key("*"));

    let (state, diags) = eng
        .update(monitor.as_ref(), &state, &monitor_config())
        .await;
    assert!(!diags.has_errors(), "{diags:?}");
    let state = state.unwrap();

    assert!(fake
        .calls()
        .contains(&format!("POST /api/v1/monitor/{id}/unmute")));
    assert!(state.attributes.get(&"silenced".parse().unwrap()).is_none());
}

#[tokio::test]
async fn refresh_reports_remote_deletion_and_delete_is_idempotent() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let monitor = provider.resource("datadog_monitor").unwrap();

    let (state, _) = eng.create(monitor.as_ref(), &monitor_config()).await;
    let state = state.unwrap();

    let diags = eng.delete(monitor.as_ref(), &state).await;
    assert!(!diags.has_errors());
    assert_eq!(fake.monitor_count(), 0);

    // Gone remotely: refresh returns no state and no error.
    let (refreshed, diags) = eng
        .refresh(monitor.as_ref(), &state, &monitor_config())
        .await;
    assert!(!diags.has_errors());
    assert!(refreshed.is_none());

    // Deleting again hits 404 and still succeeds.
    let diags = eng.delete(monitor.as_ref(), &state).await;
    assert!(!diags.has_errors(), "{diags:?}");
}

#[tokio::test]
async fn conflicting_missing_data_settings_fail_validation() {
    let fake = FakeDatadog::new();
    let eng = engine(fake);
    let provider = Provider::new().unwrap();
    let monitor = provider.resource("datadog_monitor").unwrap();

    let mut config = monitor_config();
    config
        .set(&"on_missing_data".parse().unwrap(), Value::string("resolve"))
        .unwrap();
    assert!(!eng.validate(monitor.as_ref(), &config).has_errors());

    config
        .set(&"notify_no_data".parse().unwrap(), Value::Bool(true))
        .unwrap();
    assert!(eng.validate(monitor.as_ref(), &config).has_errors());
}

#[tokio::test]
async fn failed_remote_validation_blocks_create() {
    let fake = FakeDatadog::new();
    fake.fail("POST", "/api/v1/monitor/validate", 400, 1);
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let monitor = provider.resource("datadog_monitor").unwrap();

    let (state, diags) = eng.create(monitor.as_ref(), &monitor_config()).await;
    assert!(state.is_none());
    assert!(diags.has_errors());
    assert!(!fake
        .calls()
        .iter()
        .any(|call| call == "POST /api/v1/monitor"));
}

#[tokio::test]
async fn validate_flag_skips_the_remote_check() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let monitor = provider.resource("datadog_monitor").unwrap();

    let mut config = monitor_config();
    config
        .set(&"validate".parse().unwrap(), Value::Bool(false))
        .unwrap();
    let (state, diags) = eng.create(monitor.as_ref(), &config).await;
    assert!(!diags.has_errors(), "{diags:?}");
    assert!(state.is_some());
    assert!(!fake
        .calls()
        .iter()
        .any(|call| call.ends_with("/monitor/validate")));
}
