//! The monitor resource: the richest option tree in the provider and the
//! reference for server-side normalization quirks — the `type` enum alias,
//! int/float threshold drift, the `silenced` scope map, and the dedicated
//! unmute endpoint.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{check_unparsed, translate_api_error, ApiRequest};
use crate::data::ResourceData;
use crate::diag::{Diagnostic, Diagnostics};
use crate::diff::suppress;
use crate::engine::{ProviderMeta, ResourceAdapter};
use crate::schema::{AttributeSchema, ResourceSchema};
use crate::value::{AttrPath, Value};

use super::{parse_int_id, string_items_sorted};

const DEFAULT_NO_DATA_TIMEFRAME_MINUTES: i64 = 10;

/// The server normalizes "metric alert" and "query alert" to the same
/// underlying kind and may answer with either spelling.
const TYPE_ALIASES: &[&[&str]] = &[&["metric alert", "query alert"]];

const MONITOR_TYPES: &[&str] = &[
    "composite",
    "event alert",
    "event-v2 alert",
    "log alert",
    "metric alert",
    "process alert",
    "query alert",
    "rum alert",
    "service check",
    "slo alert",
    "synthetics alert",
    "trace-analytics alert",
];

pub struct MonitorResource {
    schema: ResourceSchema,
}

impl Default for MonitorResource {
    fn default() -> Self {
        MonitorResource::new()
    }
}

impl MonitorResource {
    pub fn new() -> Self {
        MonitorResource {
            schema: monitor_schema(),
        }
    }
}

fn trim(value: Value) -> Value {
    match value.unredacted() {
        Value::String(s) => Value::string(s.trim()),
        _ => value,
    }
}

fn float_string() -> AttributeSchema {
    AttributeSchema::string()
        .validator(|value, path| {
            match value.as_str().map(|s| s.trim().parse::<f64>()) {
                Some(Ok(_)) => Diagnostics::new(),
                _ => Diagnostic::error("must be a number").at(path.clone()).into(),
            }
        })
        .suppress(suppress::float_int)
}

fn monitor_schema() -> ResourceSchema {
    ResourceSchema::new([
        ("name", AttributeSchema::string().required().normalize(trim)),
        ("message", AttributeSchema::string().required().normalize(trim)),
        (
            "escalation_message",
            AttributeSchema::string().normalize(trim),
        ),
        ("query", AttributeSchema::string().required().normalize(trim)),
        (
            "type",
            AttributeSchema::string()
                .required()
                .force_new()
                .validator(|value, path| match value.as_str() {
                    Some(s) if MONITOR_TYPES.contains(&s) => Diagnostics::new(),
                    Some(s) => Diagnostic::error(format!("invalid monitor type '{s}'"))
                        .at(path.clone())
                        .into(),
                    None => Diagnostics::new(),
                })
                .suppress(suppress::enum_alias(TYPE_ALIASES)),
        ),
        ("priority", AttributeSchema::int()),
        (
            "monitor_thresholds",
            AttributeSchema::object([
                ("ok", float_string()),
                ("warning", float_string()),
                ("critical", float_string()),
                ("unknown", float_string()),
                ("warning_recovery", float_string()),
                ("critical_recovery", float_string()),
            ]),
        ),
        (
            "monitor_threshold_windows",
            AttributeSchema::object([
                ("recovery_window", AttributeSchema::string()),
                ("trigger_window", AttributeSchema::string()),
            ]),
        ),
        (
            "notify_no_data",
            AttributeSchema::bool()
                .default_value(Value::Bool(false))
                .conflicts_with(&["on_missing_data"]),
        ),
        (
            "on_missing_data",
            AttributeSchema::string().conflicts_with(&["notify_no_data", "no_data_timeframe"]),
        ),
        ("group_retention_duration", AttributeSchema::string()),
        ("new_group_delay", AttributeSchema::int()),
        (
            "new_host_delay",
            AttributeSchema::int()
                .default_value(Value::Int(300))
                .deprecated("Use `new_group_delay` except when setting `new_host_delay` to zero."),
        ),
        ("evaluation_delay", AttributeSchema::int().optional_computed()),
        (
            "no_data_timeframe",
            AttributeSchema::int()
                .default_value(Value::Int(DEFAULT_NO_DATA_TIMEFRAME_MINUTES))
                .conflicts_with(&["on_missing_data"])
                .suppress(suppress::unless_gate("notify_no_data")),
        ),
        ("renotify_interval", AttributeSchema::int()),
        ("renotify_occurrences", AttributeSchema::int()),
        (
            "renotify_statuses",
            AttributeSchema::set_of(AttributeSchema::string()),
        ),
        ("notify_audit", AttributeSchema::bool()),
        ("timeout_h", AttributeSchema::int()),
        (
            "require_full_window",
            AttributeSchema::bool().default_value(Value::Bool(true)),
        ),
        (
            "locked",
            AttributeSchema::bool()
                .deprecated("Use `restricted_roles`.")
                .conflicts_with(&["restricted_roles"])
                .suppress(|_path, _old, _new, config| {
                    // restricted_roles wins once defined; locked becomes noise.
                    config
                        .get(&AttrPath::attr("restricted_roles"))
                        .map(|v| !v.is_null())
                        .unwrap_or(false)
                }),
        ),
        (
            "restricted_roles",
            AttributeSchema::set_of(AttributeSchema::string()).conflicts_with(&["locked"]),
        ),
        (
            "include_tags",
            AttributeSchema::bool().default_value(Value::Bool(true)),
        ),
        ("tags", AttributeSchema::set_of(AttributeSchema::string())),
        ("notify_by", AttributeSchema::set_of(AttributeSchema::string())),
        ("enable_logs_sample", AttributeSchema::bool()),
        ("groupby_simple_monitor", AttributeSchema::bool()),
        ("enable_samples", AttributeSchema::bool().computed()),
        ("force_delete", AttributeSchema::bool()),
        (
            "validate",
            // Client-side switch; never sent to the backend, never a diff.
            AttributeSchema::bool().suppress(suppress::always),
        ),
        (
            "silenced",
            AttributeSchema::map_of(AttributeSchema::int()),
        ),
    ])
}

// ─── API payload ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MonitorThresholds {
    #[serde(skip_serializing_if = "Option::is_none")]
    ok: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    critical: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unknown: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning_recovery: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    critical_recovery: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MonitorThresholdWindows {
    #[serde(skip_serializing_if = "Option::is_none")]
    recovery_window: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trigger_window: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MonitorOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    thresholds: Option<MonitorThresholds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_windows: Option<MonitorThresholdWindows>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notify_no_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_data_timeframe: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_missing_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_retention_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_group_delay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_host_delay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluation_delay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    renotify_interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    renotify_occurrences: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    renotify_statuses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notify_audit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    escalation_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_tags: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    require_full_window: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_logs_sample: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groupby_simple_monitor: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_samples: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notify_by: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    silenced: Option<BTreeMap<String, i64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MonitorPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    name: String,
    #[serde(rename = "type")]
    monitor_type: String,
    query: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<i64>,
    options: MonitorOptions,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    restricted_roles: Option<Vec<String>>,
}

// ─── Build (value tree → API request) ───────────────────────────────────────

fn get_threshold(data: &ResourceData, name: &str) -> Option<f64> {
    data.config(&AttrPath::attr("monitor_thresholds").key(name))
        .and_then(|v| match v.unredacted() {
            Value::String(s) => s.trim().parse().ok(),
            other => other.as_float(),
        })
}

// Payloads are built from the configured tree alone: an attribute the user
// removed must drop from the request, not be resurrected from prior state.
fn build_monitor(data: &ResourceData) -> MonitorPayload {
    let attr = |name: &str| AttrPath::attr(name);
    let get_int = |name: &str| data.config(&attr(name)).and_then(|v| v.as_int());
    let get_bool = |name: &str| data.config(&attr(name)).and_then(|v| v.as_bool());
    let get_str =
        |name: &str| data.config(&attr(name)).and_then(|v| v.as_str().map(str::to_string));

    let thresholds = MonitorThresholds {
        ok: get_threshold(data, "ok"),
        warning: get_threshold(data, "warning"),
        critical: get_threshold(data, "critical"),
        unknown: get_threshold(data, "unknown"),
        warning_recovery: get_threshold(data, "warning_recovery"),
        critical_recovery: get_threshold(data, "critical_recovery"),
    };
    let has_thresholds = data.config(&attr("monitor_thresholds")).is_some();

    let windows = MonitorThresholdWindows {
        recovery_window: data
            .config(&attr("monitor_threshold_windows").key("recovery_window"))
            .and_then(|v| v.as_str().map(str::to_string)),
        trigger_window: data
            .config(&attr("monitor_threshold_windows").key("trigger_window"))
            .and_then(|v| v.as_str().map(str::to_string)),
    };
    let has_windows = windows.recovery_window.is_some() || windows.trigger_window.is_some();

    let monitor_type = get_str("type").unwrap_or_default();
    let on_missing_data = get_str("on_missing_data");

    let mut options = MonitorOptions {
        thresholds: has_thresholds.then_some(thresholds),
        threshold_windows: has_windows.then_some(windows),
        // notify_no_data and on_missing_data are mutually exclusive on the
        // wire as well as in the schema.
        notify_no_data: if on_missing_data.is_none() {
            Some(get_bool("notify_no_data").unwrap_or(false))
        } else {
            None
        },
        on_missing_data: on_missing_data.clone(),
        group_retention_duration: get_str("group_retention_duration"),
        new_group_delay: get_int("new_group_delay"),
        // new_host_delay is sent unconditionally (including zero): the
        // schema default keeps it present, and omitting it would re-enable
        // the server default for monitors grouped by host.
        new_host_delay: Some(get_int("new_host_delay").unwrap_or(300)),
        evaluation_delay: get_int("evaluation_delay"),
        // no_data_timeframe cannot be combined with on_missing_data; the
        // schema default of 10 would otherwise always ride along.
        no_data_timeframe: if on_missing_data.is_none() {
            get_int("no_data_timeframe")
        } else {
            None
        },
        renotify_interval: get_int("renotify_interval"),
        renotify_occurrences: get_int("renotify_occurrences"),
        renotify_statuses: data
            .config(&attr("renotify_statuses"))
            .map(|v| string_items_sorted(Some(v))),
        notify_audit: get_bool("notify_audit"),
        timeout_h: get_int("timeout_h"),
        escalation_message: get_str("escalation_message"),
        include_tags: Some(get_bool("include_tags").unwrap_or(true)),
        require_full_window: Some(get_bool("require_full_window").unwrap_or(true)),
        locked: get_bool("locked"),
        enable_logs_sample: None,
        groupby_simple_monitor: None,
        enable_samples: None,
        notify_by: data
            .config(&attr("notify_by"))
            .map(|v| string_items_sorted(Some(v))),
        silenced: data.config(&attr("silenced")).and_then(|v| {
            v.as_entries().map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_int().map(|ts| (k.clone(), ts)))
                    .collect()
            })
        }),
    };

    // Log-monitor-only options; sending them for other types changes
    // server behavior.
    if monitor_type == "log alert" {
        options.enable_logs_sample = Some(get_bool("enable_logs_sample").unwrap_or(false));
        options.groupby_simple_monitor = get_bool("groupby_simple_monitor");
    }

    MonitorPayload {
        id: None,
        name: get_str("name").unwrap_or_default(),
        monitor_type,
        query: get_str("query").unwrap_or_default(),
        message: get_str("message").unwrap_or_default(),
        priority: get_int("priority"),
        options,
        tags: string_items_sorted(data.config(&attr("tags"))),
        restricted_roles: data
            .config(&attr("restricted_roles"))
            .map(|v| string_items_sorted(Some(v))),
    }
}

// ─── Flatten (API response → value tree) ────────────────────────────────────

/// Format a threshold the way it is configured: whole floats render without
/// the trailing `.0` so `0.9` and `1` survive round-trips.
fn threshold_string(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn flatten_monitor(data: &mut ResourceData, monitor: &MonitorPayload) {
    let attr = |name: &str| AttrPath::attr(name);
    let set_str = |data: &mut ResourceData, name: &str, v: &Option<String>| {
        if let Some(s) = v {
            data.set(&attr(name), Value::string(s.clone()));
        }
    };
    let set_int = |data: &mut ResourceData, name: &str, v: Option<i64>| {
        if let Some(i) = v {
            data.set(&attr(name), Value::Int(i));
        }
    };
    let set_bool = |data: &mut ResourceData, name: &str, v: Option<bool>| {
        if let Some(b) = v {
            data.set(&attr(name), Value::Bool(b));
        }
    };

    data.set(&attr("name"), Value::string(monitor.name.clone()));
    data.set(&attr("type"), Value::string(monitor.monitor_type.clone()));
    data.set(&attr("query"), Value::string(monitor.query.clone()));
    data.set(&attr("message"), Value::string(monitor.message.clone()));
    set_int(data, "priority", monitor.priority);

    let o = &monitor.options;
    if let Some(t) = &o.thresholds {
        let mut entries = BTreeMap::new();
        for (name, v) in [
            ("ok", t.ok),
            ("warning", t.warning),
            ("critical", t.critical),
            ("unknown", t.unknown),
            ("warning_recovery", t.warning_recovery),
            ("critical_recovery", t.critical_recovery),
        ] {
            if let Some(v) = v {
                entries.insert(name.to_string(), Value::string(threshold_string(v)));
            }
        }
        if !entries.is_empty() {
            data.set(&attr("monitor_thresholds"), Value::Object(entries));
        }
    }
    if let Some(w) = &o.threshold_windows {
        let mut entries = BTreeMap::new();
        if let Some(r) = &w.recovery_window {
            entries.insert("recovery_window".to_string(), Value::string(r.clone()));
        }
        if let Some(t) = &w.trigger_window {
            entries.insert("trigger_window".to_string(), Value::string(t.clone()));
        }
        if !entries.is_empty() {
            data.set(&attr("monitor_threshold_windows"), Value::Object(entries));
        }
    }

    set_bool(data, "notify_no_data", o.notify_no_data);
    set_int(data, "no_data_timeframe", o.no_data_timeframe);
    set_str(data, "on_missing_data", &o.on_missing_data);
    set_str(data, "group_retention_duration", &o.group_retention_duration);
    set_int(data, "new_group_delay", o.new_group_delay);
    set_int(data, "new_host_delay", o.new_host_delay);
    set_int(data, "evaluation_delay", o.evaluation_delay);
    set_int(data, "renotify_interval", o.renotify_interval);
    set_int(data, "renotify_occurrences", o.renotify_occurrences);
    set_bool(data, "notify_audit", o.notify_audit);
    set_int(data, "timeout_h", o.timeout_h);
    set_str(data, "escalation_message", &o.escalation_message);
    set_bool(data, "include_tags", o.include_tags);
    set_bool(data, "require_full_window", o.require_full_window);
    set_bool(data, "locked", o.locked);
    set_bool(data, "enable_logs_sample", o.enable_logs_sample);
    set_bool(data, "groupby_simple_monitor", o.groupby_simple_monitor);
    set_bool(data, "enable_samples", o.enable_samples);

    if let Some(statuses) = &o.renotify_statuses {
        data.set(
            &attr("renotify_statuses"),
            Value::Set(statuses.iter().map(Value::string).collect()),
        );
    }
    if let Some(notify_by) = &o.notify_by {
        data.set(
            &attr("notify_by"),
            Value::Set(notify_by.iter().map(Value::string).collect()),
        );
    }

    if !monitor.tags.is_empty() {
        let mut tags = monitor.tags.clone();
        tags.sort();
        data.set(&attr("tags"), Value::Set(tags.into_iter().map(Value::string).collect()));
    }

    if let Some(roles) = &monitor.restricted_roles {
        if !roles.is_empty() {
            let mut roles = roles.clone();
            roles.sort();
            data.set(
                &attr("restricted_roles"),
                Value::Set(roles.into_iter().map(Value::string).collect()),
            );
        }
    }

    flatten_silenced(data, o.silenced.as_ref());
}

/// Scope values of -1 mean muted indefinitely; 0 and future timestamps are
/// live mutes. Past timestamps are historical noise from expired mutes: the
/// stored state for those keys is synced to the configuration so they never
/// show as drift.
fn flatten_silenced(data: &mut ResourceData, silenced: Option<&BTreeMap<String, i64>>) {
    let silenced = match silenced {
        Some(s) if !s.is_empty() => s,
        _ => return,
    };
    let now = chrono::Utc::now().timestamp();
    let configured = data
        .config(&AttrPath::attr("silenced"))
        .and_then(|v| v.as_entries().cloned())
        .unwrap_or_default();

    let mut entries = BTreeMap::new();
    for (scope, &ts) in silenced {
        let historical = ts > 0 && ts < now;
        if historical {
            match configured.get(scope) {
                Some(v) => {
                    entries.insert(scope.clone(), v.clone());
                }
                None => debug!(scope, ts, "dropping expired mute from state"),
            }
        } else {
            entries.insert(scope.clone(), Value::Int(ts));
        }
    }
    if !entries.is_empty() {
        data.set(&AttrPath::attr("silenced"), Value::Map(entries));
    }
}

// ─── CRUD ───────────────────────────────────────────────────────────────────

fn silenced_scopes(value: Option<Value>) -> BTreeMap<String, i64> {
    value
        .as_ref()
        .and_then(Value::as_entries)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_int().map(|ts| (k.clone(), ts)))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ResourceAdapter for MonitorResource {
    fn type_name(&self) -> &'static str {
        "datadog_monitor"
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    async fn validate_remote(&self, data: &ResourceData, meta: &ProviderMeta) -> Diagnostics {
        if let Some(false) = data.get_ok(&AttrPath::attr("validate")).and_then(|v| v.as_bool()) {
            return Diagnostics::new();
        }
        let payload = build_monitor(data);
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => return Diagnostics::from_error(format!("error encoding monitor: {e}")),
        };
        match meta
            .api
            .send(ApiRequest::post("/api/v1/monitor/validate", body), &meta.cancel)
            .await
        {
            Ok(response) if response.ok() => Diagnostics::new(),
            Ok(response) => {
                translate_api_error(None, Some(&response), "error validating monitor").into()
            }
            Err(err) => translate_api_error(Some(&err), None, "error validating monitor").into(),
        }
    }

    async fn create(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let payload = build_monitor(data);
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => return Diagnostics::from_error(format!("error encoding monitor: {e}")),
        };
        let response = match meta
            .api
            .send(ApiRequest::post("/api/v1/monitor", body), &meta.cancel)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error creating monitor").into()
            }
        };
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error creating monitor").into();
        }
        match response.body.get("id").and_then(|v| v.as_i64()) {
            Some(id) => {
                data.set_id(id.to_string());
                Diagnostics::new()
            }
            None => Diagnostics::from_error("monitor create response carried no id"),
        }
    }

    async fn read(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let id = match parse_int_id(data.id(), "monitor") {
            Ok(id) => id,
            Err(diags) => return diags,
        };
        let response = match meta
            .api
            .send(ApiRequest::get(format!("/api/v1/monitor/{id}")), &meta.cancel)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error getting monitor").into()
            }
        };
        if response.status == 404 {
            data.set_id("");
            return Diagnostics::new();
        }
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error getting monitor").into();
        }

        let mut diags = Diagnostics::new();
        let monitor: MonitorPayload = match serde_json::from_value(response.body.clone()) {
            Ok(monitor) => monitor,
            Err(e) => {
                return Diagnostics::from_error(format!("error decoding monitor response: {e}"))
            }
        };
        if let Some(warning) = check_unparsed(&response.body, &monitor, "monitor") {
            diags.push(warning);
        }
        flatten_monitor(data, &monitor);
        diags
    }

    async fn update(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let id = match parse_int_id(data.id(), "monitor") {
            Ok(id) => id,
            Err(diags) => return diags,
        };
        let mut payload = build_monitor(data);
        payload.id = Some(id);
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => return Diagnostics::from_error(format!("error encoding monitor: {e}")),
        };
        let response = match meta
            .api
            .send(ApiRequest::put(format!("/api/v1/monitor/{id}"), body), &meta.cancel)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return translate_api_error(Some(&err), None, "error updating monitor").into()
            }
        };
        if !response.ok() {
            return translate_api_error(None, Some(&response), "error updating monitor").into();
        }

        // Unmuting is asynchronous server-side and cannot be expressed in
        // the main payload: each scope leaving the silenced map needs one
        // call to the dedicated unmute endpoint.
        let (old_silenced, new_silenced) = data.get_change(&AttrPath::attr("silenced"));
        let old_scopes = silenced_scopes(Some(old_silenced));
        let new_scopes = silenced_scopes(Some(new_silenced));
        for scope in old_scopes.keys() {
            if new_scopes.contains_key(scope) {
                continue;
            }
            debug!(monitor = id, scope = %scope, "unmuting scope");
            let unmute = ApiRequest::post(
                format!("/api/v1/monitor/{id}/unmute"),
                serde_json::json!({ "scope": scope }),
            );
            match meta.api.send(unmute, &meta.cancel).await {
                Ok(response) if response.ok() => {}
                Ok(response) => {
                    return translate_api_error(
                        None,
                        Some(&response),
                        &format!("error unmuting monitor scope '{scope}'"),
                    )
                    .into()
                }
                Err(err) => {
                    return translate_api_error(
                        Some(&err),
                        None,
                        &format!("error unmuting monitor scope '{scope}'"),
                    )
                    .into()
                }
            }
        }
        Diagnostics::new()
    }

    async fn delete(&self, data: &mut ResourceData, meta: &ProviderMeta) -> Diagnostics {
        let id = match parse_int_id(data.id(), "monitor") {
            Ok(id) => id,
            Err(diags) => return diags,
        };
        let force = data
            .get_ok(&AttrPath::attr("force_delete"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let path = if force {
            format!("/api/v1/monitor/{id}?force=true")
        } else {
            format!("/api/v1/monitor/{id}")
        };
        match meta.api.send(ApiRequest::delete(path), &meta.cancel).await {
            // Already gone out-of-band: deletion is idempotent.
            Ok(response) if response.ok() || response.status == 404 => Diagnostics::new(),
            Ok(response) => {
                translate_api_error(None, Some(&response), "error deleting monitor").into()
            }
            Err(err) => translate_api_error(Some(&err), None, "error deleting monitor").into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_consistent() {
        monitor_schema().check_consistency().unwrap();
    }

    #[test]
    fn build_excludes_no_data_timeframe_when_on_missing_data_set() {
        let config = Value::object([
            ("name", Value::string("m")),
            ("type", Value::string("log alert")),
            ("query", Value::string("q")),
            ("message", Value::string("msg")),
            ("on_missing_data", Value::string("resolve")),
            ("no_data_timeframe", Value::Int(10)),
        ]);
        let data = ResourceData::for_create(config);
        let payload = build_monitor(&data);
        assert!(payload.options.no_data_timeframe.is_none());
        assert_eq!(payload.options.on_missing_data.as_deref(), Some("resolve"));
    }

    #[test]
    fn build_sends_log_options_only_for_log_alerts() {
        let base = [
            ("name", Value::string("m")),
            ("query", Value::string("q")),
            ("message", Value::string("msg")),
            ("enable_logs_sample", Value::Bool(true)),
        ];
        let mut log_config: Vec<(&str, Value)> = base.to_vec();
        log_config.push(("type", Value::string("log alert")));
        let payload = build_monitor(&ResourceData::for_create(Value::object(log_config)));
        assert_eq!(payload.options.enable_logs_sample, Some(true));

        let mut metric_config: Vec<(&str, Value)> = base.to_vec();
        metric_config.push(("type", Value::string("metric alert")));
        let payload = build_monitor(&ResourceData::for_create(Value::object(metric_config)));
        assert!(payload.options.enable_logs_sample.is_none());
    }

    #[test]
    fn thresholds_parse_from_strings_and_render_back() {
        let config = Value::object([
            ("name", Value::string("m")),
            ("type", Value::string("metric alert")),
            ("query", Value::string("q")),
            ("message", Value::string("msg")),
            (
                "monitor_thresholds",
                Value::object([
                    ("critical", Value::string("0.9")),
                    ("warning", Value::string("1")),
                ]),
            ),
        ]);
        let data = ResourceData::for_create(config);
        let payload = build_monitor(&data);
        let t = payload.options.thresholds.as_ref().unwrap();
        assert_eq!(t.critical, Some(0.9));
        assert_eq!(t.warning, Some(1.0));

        assert_eq!(threshold_string(1.0), "1");
        assert_eq!(threshold_string(0.9), "0.9");
    }

    #[test]
    fn expired_mutes_sync_to_config() {
        let now = chrono::Utc::now().timestamp();
        let mut server = BTreeMap::new();
        server.insert("env:prod".to_string(), -1);
        server.insert("env:stage".to_string(), now - 3600); // expired
        server.insert("env:dev".to_string(), now + 3600); // still muted

        // env:stage expired but is still configured: state follows config.
        let config = Value::object([(
            "silenced",
            Value::Map(BTreeMap::from([
                ("env:prod".to_string(), Value::Int(-1)),
                ("env:stage".to_string(), Value::Int(now - 3600)),
            ])),
        )]);
        let mut data = ResourceData::for_instance("1", Value::Null, config);
        flatten_silenced(&mut data, Some(&server));
        let state = data.state_root().get(&AttrPath::attr("silenced")).unwrap();
        let entries = state.as_entries().unwrap();
        assert_eq!(entries.get("env:prod"), Some(&Value::Int(-1)));
        assert_eq!(entries.get("env:stage"), Some(&Value::Int(now - 3600)));
        assert_eq!(entries.get("env:dev"), Some(&Value::Int(now + 3600)));

        // Unconfigured expired mutes are dropped from state entirely.
        let mut data = ResourceData::for_instance("1", Value::Null, Value::object([]));
        let mut server = BTreeMap::new();
        server.insert("env:old".to_string(), now - 10);
        flatten_silenced(&mut data, Some(&server));
        assert!(data.state_root().get(&AttrPath::attr("silenced")).is_none());
    }
}
