//! In-memory stand-in for the Datadog API, plus engine wiring helpers.
//! Routes the handful of endpoint families the adapters use and records
//! every call in order so tests can assert on request sequencing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use serde_json::{json, Value as Json};
use tokio_util::sync::CancellationToken;

use datadog_provider::api::{ApiClient, ApiError, ApiRequest, ApiResponse, Transport};
use datadog_provider::engine::{Engine, ProviderMeta};
use datadog_provider::lock::LockRegistry;

#[derive(Default)]
struct Fault {
    method: String,
    path_prefix: String,
    status: u16,
    remaining: u32,
}

#[derive(Default)]
struct State {
    calls: Vec<String>,
    faults: Vec<Fault>,

    monitors: BTreeMap<i64, Json>,
    next_monitor_id: i64,

    pipelines: BTreeMap<String, Json>,
    next_pipeline_id: u64,

    dashboard_lists: BTreeMap<i64, String>,
    memberships: BTreeMap<i64, Vec<Json>>,
    next_list_id: i64,

    aws_accounts: Vec<Json>,
    users: Vec<Json>,
}

#[derive(Default)]
pub struct FakeDatadog {
    state: Mutex<State>,
}

impl FakeDatadog {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeDatadog::default())
    }

    /// Ordered "METHOD path" log of every request received.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Make the next `count` requests matching method + path prefix answer
    /// with the given status instead of being routed.
    pub fn fail(&self, method: &str, path_prefix: &str, status: u16, count: u32) {
        self.state.lock().unwrap().faults.push(Fault {
            method: method.to_string(),
            path_prefix: path_prefix.to_string(),
            status,
            remaining: count,
        });
    }

    pub fn add_user(&self, id: &str, handle: &str, name: &str, email: &str) {
        self.state.lock().unwrap().users.push(json!({
            "id": id,
            "attributes": {"handle": handle, "name": name, "email": email},
        }));
    }

    pub fn seed_aws_account(&self, account_id: &str, role_name: &str) {
        self.state.lock().unwrap().aws_accounts.push(json!({
            "account_id": account_id,
            "role_name": role_name,
            "external_id": "seeded-external-id",
        }));
    }

    pub fn monitor(&self, id: i64) -> Option<Json> {
        self.state.lock().unwrap().monitors.get(&id).cloned()
    }

    pub fn monitor_count(&self) -> usize {
        self.state.lock().unwrap().monitors.len()
    }

    pub fn pipeline(&self, id: &str) -> Option<Json> {
        self.state.lock().unwrap().pipelines.get(id).cloned()
    }

    pub fn membership(&self, list_id: i64) -> Vec<Json> {
        self.state
            .lock()
            .unwrap()
            .memberships
            .get(&list_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn response(status: u16, body: Json) -> ApiResponse {
    ApiResponse { status, body }
}

fn not_found(what: &str) -> ApiResponse {
    response(404, json!({"errors": [format!("{what} not found")]}))
}

/// The server stores "metric alert" as "query alert".
fn normalize_monitor(mut monitor: Json) -> Json {
    if monitor.get("type").and_then(Json::as_str) == Some("metric alert") {
        monitor["type"] = json!("query alert");
    }
    monitor
}

#[async_trait]
impl Transport for FakeDatadog {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut state = self.state.lock().unwrap();
        let method = request.method.to_string();
        state.calls.push(format!("{method} {}", request.path));

        for fault in state.faults.iter_mut() {
            if fault.remaining > 0
                && fault.method == method
                && request.path.starts_with(&fault.path_prefix)
            {
                fault.remaining -= 1;
                let status = fault.status;
                return Ok(response(status, json!({"errors": ["injected failure"]})));
            }
        }

        let (path, query) = match request.path.split_once('?') {
            Some((p, q)) => (p.to_string(), q.to_string()),
            None => (request.path.clone(), String::new()),
        };
        let body = request.body.clone().unwrap_or(Json::Null);
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        let resp = match (method.as_str(), segments.as_slice()) {
            ("GET", ["api", "v1", "validate"]) => response(200, json!({"valid": true})),

            // Monitors.
            ("POST", ["api", "v1", "monitor", "validate"]) => response(200, json!({})),
            ("POST", ["api", "v1", "monitor"]) => {
                state.next_monitor_id += 1;
                let id = 1000 + state.next_monitor_id;
                let mut monitor = normalize_monitor(body);
                monitor["id"] = json!(id);
                state.monitors.insert(id, monitor.clone());
                response(200, monitor)
            }
            ("GET", ["api", "v1", "monitor", id]) => match id.parse::<i64>() {
                Ok(id) => match state.monitors.get(&id) {
                    Some(monitor) => response(200, monitor.clone()),
                    None => not_found("Monitor"),
                },
                Err(_) => not_found("Monitor"),
            },
            ("PUT", ["api", "v1", "monitor", id]) => match id.parse::<i64>() {
                Ok(id) if state.monitors.contains_key(&id) => {
                    let mut monitor = normalize_monitor(body);
                    monitor["id"] = json!(id);
                    state.monitors.insert(id, monitor.clone());
                    response(200, monitor)
                }
                _ => not_found("Monitor"),
            },
            ("DELETE", ["api", "v1", "monitor", id]) => match id.parse::<i64>() {
                Ok(id) if state.monitors.remove(&id).is_some() => {
                    response(200, json!({"deleted_monitor_id": id}))
                }
                _ => not_found("Monitor"),
            },
            ("POST", ["api", "v1", "monitor", id, "unmute"]) => match id.parse::<i64>() {
                Ok(id) => {
                    let scope = body.get("scope").and_then(Json::as_str).map(str::to_string);
                    match (state.monitors.get_mut(&id), scope) {
                        (Some(monitor), Some(scope)) => {
                            if let Some(silenced) = monitor
                                .pointer_mut("/options/silenced")
                                .and_then(Json::as_object_mut)
                            {
                                silenced.remove(&scope);
                            }
                            response(200, monitor.clone())
                        }
                        _ => not_found("Monitor"),
                    }
                }
                Err(_) => not_found("Monitor"),
            },

            // Logs pipelines. Unknown IDs answer 400, as the real API does.
            ("POST", ["api", "v1", "logs", "config", "pipelines"]) => {
                state.next_pipeline_id += 1;
                let id = format!("pipe-{}", state.next_pipeline_id);
                let mut pipeline = body;
                pipeline["id"] = json!(id);
                state.pipelines.insert(id, pipeline.clone());
                response(200, pipeline)
            }
            ("GET", ["api", "v1", "logs", "config", "pipelines", id]) => {
                match state.pipelines.get(*id) {
                    Some(pipeline) => response(200, pipeline.clone()),
                    None => response(400, json!({"errors": ["pipeline id invalid"]})),
                }
            }
            ("PUT", ["api", "v1", "logs", "config", "pipelines", id]) => {
                if state.pipelines.contains_key(*id) {
                    let mut pipeline = body;
                    pipeline["id"] = json!(id);
                    state.pipelines.insert(id.to_string(), pipeline.clone());
                    response(200, pipeline)
                } else {
                    response(400, json!({"errors": ["pipeline id invalid"]}))
                }
            }
            ("DELETE", ["api", "v1", "logs", "config", "pipelines", id]) => {
                if state.pipelines.remove(*id).is_some() {
                    response(200, json!({}))
                } else {
                    response(400, json!({"errors": ["pipeline id invalid"]}))
                }
            }

            // Dashboard lists, v1 shell.
            ("POST", ["api", "v1", "dashboard", "lists", "manual"]) => {
                state.next_list_id += 1;
                let id = 100 + state.next_list_id;
                let name = body.get("name").and_then(Json::as_str).unwrap_or("").to_string();
                state.dashboard_lists.insert(id, name.clone());
                response(200, json!({"id": id, "name": name}))
            }
            ("GET", ["api", "v1", "dashboard", "lists", "manual", id]) => {
                match id.parse::<i64>().ok().and_then(|id| state.dashboard_lists.get(&id)) {
                    Some(name) => response(200, json!({"id": id, "name": name})),
                    None => not_found("Dashboard list"),
                }
            }
            ("PUT", ["api", "v1", "dashboard", "lists", "manual", id]) => match id.parse::<i64>() {
                Ok(id) if state.dashboard_lists.contains_key(&id) => {
                    let name = body.get("name").and_then(Json::as_str).unwrap_or("").to_string();
                    state.dashboard_lists.insert(id, name.clone());
                    response(200, json!({"id": id, "name": name}))
                }
                _ => not_found("Dashboard list"),
            },
            ("DELETE", ["api", "v1", "dashboard", "lists", "manual", id]) => {
                match id.parse::<i64>() {
                    Ok(id) if state.dashboard_lists.remove(&id).is_some() => {
                        state.memberships.remove(&id);
                        response(200, json!({}))
                    }
                    _ => not_found("Dashboard list"),
                }
            }

            // Dashboard list membership, v2.
            ("GET", ["api", "v2", "dashboard", "lists", "manual", id, "dashboards"]) => {
                let items = id
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| state.memberships.get(&id).cloned())
                    .unwrap_or_default();
                response(200, json!({"dashboards": items}))
            }
            ("POST", ["api", "v2", "dashboard", "lists", "manual", id, "dashboards"]) => {
                match id.parse::<i64>() {
                    Ok(id) => {
                        let added: Vec<Json> = body
                            .get("dashboards")
                            .and_then(Json::as_array)
                            .cloned()
                            .unwrap_or_default();
                        state.memberships.entry(id).or_default().extend(added.clone());
                        response(200, json!({"added_dashboards_to_list": added}))
                    }
                    Err(_) => not_found("Dashboard list"),
                }
            }
            ("DELETE", ["api", "v2", "dashboard", "lists", "manual", id, "dashboards"]) => {
                match id.parse::<i64>() {
                    Ok(id) => {
                        let removed: Vec<Json> = body
                            .get("dashboards")
                            .and_then(Json::as_array)
                            .cloned()
                            .unwrap_or_default();
                        if let Some(items) = state.memberships.get_mut(&id) {
                            items.retain(|item| {
                                !removed.iter().any(|r| {
                                    r.get("id") == item.get("id")
                                        && r.get("type") == item.get("type")
                                })
                            });
                        }
                        response(200, json!({"deleted_dashboards_from_list": removed}))
                    }
                    Err(_) => not_found("Dashboard list"),
                }
            }

            // AWS integration.
            ("POST", ["api", "v1", "integration", "aws"]) => {
                state.aws_accounts.push(body);
                response(200, json!({"external_id": "generated-external-id"}))
            }
            ("GET", ["api", "v1", "integration", "aws"]) => {
                response(200, json!({"accounts": state.aws_accounts}))
            }
            ("PUT", ["api", "v1", "integration", "aws"]) => {
                let account_id = query_param(&query, "account_id").map(|v| percent_decode(&v));
                let role_name = query_param(&query, "role_name").map(|v| percent_decode(&v));
                let found = state.aws_accounts.iter_mut().find(|account| {
                    account.get("account_id").and_then(Json::as_str) == account_id.as_deref()
                        && account.get("role_name").and_then(Json::as_str) == role_name.as_deref()
                });
                match found {
                    Some(account) => {
                        if let (Some(target), Some(source)) =
                            (account.as_object_mut(), body.as_object())
                        {
                            for (k, v) in source {
                                target.insert(k.clone(), v.clone());
                            }
                        }
                        response(200, json!({}))
                    }
                    None => not_found("AWS account"),
                }
            }
            ("DELETE", ["api", "v1", "integration", "aws"]) => {
                let account_id = body.get("account_id").and_then(Json::as_str).map(str::to_string);
                let role_name = body.get("role_name").and_then(Json::as_str).map(str::to_string);
                let before = state.aws_accounts.len();
                state.aws_accounts.retain(|account| {
                    !(account.get("account_id").and_then(Json::as_str) == account_id.as_deref()
                        && account.get("role_name").and_then(Json::as_str)
                            == role_name.as_deref())
                });
                if state.aws_accounts.len() < before {
                    response(200, json!({}))
                } else {
                    not_found("AWS account")
                }
            }

            // Users.
            ("GET", ["api", "v2", "users"]) => {
                let filter = query_param(&query, "filter")
                    .map(|f| percent_decode(&f))
                    .unwrap_or_default();
                let matched: Vec<Json> = state
                    .users
                    .iter()
                    .filter(|user| {
                        ["handle", "email", "name"].iter().any(|field| {
                            user.pointer(&format!("/attributes/{field}"))
                                .and_then(Json::as_str)
                                .is_some_and(|v| v.contains(&filter))
                        })
                    })
                    .cloned()
                    .collect();
                response(200, json!({"data": matched}))
            }

            _ => response(404, json!({"errors": [format!("no route for {method} {path}")]})),
        };
        Ok(resp)
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(b) = u8::from_str_radix(&s[i + 1..i + 3], 16) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

static TRACING: Once = Once::new();

/// Engine logs go to the test writer, filtered by RUST_LOG.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Engine over the fake transport, no retries, fresh cancellation token.
pub fn engine(fake: Arc<FakeDatadog>) -> Engine {
    engine_with_cancel(fake, CancellationToken::new())
}

pub fn engine_with_cancel(fake: Arc<FakeDatadog>, cancel: CancellationToken) -> Engine {
    init_tracing();
    Engine::new(ProviderMeta {
        api: Arc::new(ApiClient::without_retry(fake)),
        locks: Arc::new(LockRegistry::new()),
        cancel,
    })
}
