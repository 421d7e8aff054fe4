pub mod dashboard_list;
pub mod integration_aws;
pub mod logs_pipeline;
pub mod monitor;
pub mod processors;

use crate::diag::Diagnostics;
use crate::value::Value;

/// Shared helper: the numeric resource IDs Datadog assigns are stored as
/// base-10 strings in state.
pub(crate) fn parse_int_id(id: &str, resource: &str) -> Result<i64, Diagnostics> {
    id.parse::<i64>().map_err(|_| {
        Diagnostics::from_error(format!("invalid {resource} id '{id}': expected an integer"))
    })
}

/// Collect a configured list/set of strings, sorted for stable state.
pub(crate) fn string_items_sorted(value: Option<Value>) -> Vec<String> {
    let mut items: Vec<String> = value
        .as_ref()
        .and_then(Value::as_items)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    items.sort();
    items
}
