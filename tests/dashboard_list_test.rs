mod common;

use common::{engine, FakeDatadog};
use datadog_provider::provider::Provider;
use datadog_provider::value::Value;

fn list_config(items: &[(&str, &str)]) -> Value {
    Value::object([
        ("name", Value::string("team dashboards")),
        (
            "dash_item",
            Value::Set(
                items
                    .iter()
                    .map(|(kind, id)| {
                        Value::object([
                            ("type", Value::string(*kind)),
                            ("dash_id", Value::string(*id)),
                        ])
                    })
                    .collect(),
            ),
        ),
    ])
}

#[tokio::test]
async fn create_makes_the_shell_before_touching_membership() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let list = provider.resource("datadog_dashboard_list").unwrap();

    let config = list_config(&[("custom_timeboard", "abc-123")]);
    let (state, diags) = eng.create(list.as_ref(), &config).await;
    assert!(!diags.has_errors(), "{diags:?}");
    let state = state.unwrap();
    let id: i64 = state.id.parse().unwrap();

    let calls = fake.calls();
    let shell = calls
        .iter()
        .position(|c| c == "POST /api/v1/dashboard/lists/manual")
        .unwrap();
    let first_v2 = calls
        .iter()
        .position(|c| c.contains("/api/v2/dashboard"))
        .unwrap();
    assert!(shell < first_v2);

    let members = fake.membership(id);
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["id"], "abc-123");
    assert_eq!(members[0]["type"], "custom_timeboard");
}

#[tokio::test]
async fn membership_failure_still_records_the_list_id() {
    let fake = FakeDatadog::new();
    fake.fail("POST", "/api/v2/dashboard", 500, 1);
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let list = provider.resource("datadog_dashboard_list").unwrap();

    let config = list_config(&[("custom_timeboard", "abc-123")]);
    let (state, diags) = eng.create(list.as_ref(), &config).await;
    assert!(diags.has_errors());

    // The shell exists; losing the ID would leak it.
    let state = state.unwrap();
    assert!(!state.id.is_empty());
    assert!(fake.membership(state.id.parse().unwrap()).is_empty());
}

#[tokio::test]
async fn update_replaces_the_whole_membership() {
    let fake = FakeDatadog::new();
    let eng = engine(fake.clone());
    let provider = Provider::new().unwrap();
    let list = provider.resource("datadog_dashboard_list").unwrap();

    let (state, _) = eng
        .create(list.as_ref(), &list_config(&[("custom_timeboard", "abc-123")]))
        .await;
    let state = state.unwrap();
    let id: i64 = state.id.parse().unwrap();

    let next = list_config(&[
        ("custom_screenboard", "def-456"),
        ("host_timeboard", "ghi-789"),
    ]);
    let (state, diags) = eng.update(list.as_ref(), &state, &next).await;
    assert!(!diags.has_errors(), "{diags:?}");
    assert!(state.is_some());

    let members = fake.membership(id);
    assert_eq!(members.len(), 2);
    assert!(!members.iter().any(|m| m["id"] == "abc-123"));

    // Replacement is read, clear, insert on the membership sub-resource.
    let calls = fake.calls();
    let sub = format!("/api/v2/dashboard/lists/manual/{id}/dashboards");
    let after_put = calls
        .iter()
        .position(|c| c == &format!("PUT /api/v1/dashboard/lists/manual/{id}"))
        .unwrap();
    let tail: Vec<&str> = calls[after_put..]
        .iter()
        .filter(|c| c.ends_with(&sub))
        .map(|c| c.split(' ').next().unwrap())
        .collect();
    assert_eq!(&tail[..3], ["GET", "DELETE", "POST"]);
}

#[tokio::test]
async fn rejects_an_unknown_dashboard_type() {
    let fake = FakeDatadog::new();
    let eng = engine(fake);
    let provider = Provider::new().unwrap();
    let list = provider.resource("datadog_dashboard_list").unwrap();

    let config = list_config(&[("notebook", "abc-123")]);
    assert!(eng.validate(list.as_ref(), &config).has_errors());
}
