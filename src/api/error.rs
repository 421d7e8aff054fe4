//! The single place where failed API calls become diagnostics. Every adapter
//! funnels HTTP failures through `translate_api_error` so the context string,
//! status, server body, and retry/credential hints are reported uniformly.

use serde::Serialize;
use thiserror::Error;

use crate::diag::Diagnostic;

use super::client::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("operation cancelled")]
    Cancelled,
}

/// Translate a failed call into one error diagnostic. Pass the response when
/// one was received; pass the transport error otherwise. 404-on-read is not
/// an error and must be handled by the caller before reaching this.
pub fn translate_api_error(
    error: Option<&ApiError>,
    response: Option<&ApiResponse>,
    context: &str,
) -> Diagnostic {
    if let Some(err) = error {
        return Diagnostic::error(context).with_detail(err.to_string());
    }
    let response = match response {
        Some(r) => r,
        None => return Diagnostic::error(context),
    };

    let mut detail = format!("HTTP {}", response.status);
    if let Some(messages) = server_errors(&response.body) {
        detail.push_str(": ");
        detail.push_str(&messages.join("; "));
    }
    match response.status {
        401 | 403 => detail.push_str(" (check your API and application keys)"),
        429 => detail.push_str(" (rate limited; the request was retried up to the retry budget)"),
        500..=599 => detail.push_str(" (transient server error; retried up to the retry budget)"),
        _ => {}
    }
    Diagnostic::error(context).with_detail(detail)
}

/// Datadog error bodies carry `{"errors": ["..."]}` on both API versions.
fn server_errors(body: &serde_json::Value) -> Option<Vec<String>> {
    let errors = body.get("errors")?.as_array()?;
    let messages: Vec<String> = errors
        .iter()
        .filter_map(|e| e.as_str().map(str::to_string))
        .collect();
    (!messages.is_empty()).then_some(messages)
}

/// Detect version skew: fields in the raw server response that the typed
/// payload did not capture. Returns an advisory warning; execution
/// continues with the parsed subset.
pub fn check_unparsed<T: Serialize>(
    raw: &serde_json::Value,
    parsed: &T,
    context: &str,
) -> Option<Diagnostic> {
    let reserialized = serde_json::to_value(parsed).ok()?;
    let mut unknown = Vec::new();
    collect_unknown(raw, &reserialized, String::new(), &mut unknown);
    if unknown.is_empty() {
        return None;
    }
    Some(
        Diagnostic::warning(format!("{context}: response contains unsupported fields"))
            .with_detail(format!(
                "the server returned fields this provider does not understand \
                 (version skew?): {}",
                unknown.join(", ")
            )),
    )
}

fn collect_unknown(
    raw: &serde_json::Value,
    parsed: &serde_json::Value,
    prefix: String,
    out: &mut Vec<String>,
) {
    match (raw, parsed) {
        (serde_json::Value::Object(raw_map), serde_json::Value::Object(parsed_map)) => {
            for (key, raw_child) in raw_map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match parsed_map.get(key) {
                    Some(parsed_child) => collect_unknown(raw_child, parsed_child, path, out),
                    // Nulls the client dropped are not skew.
                    None if !raw_child.is_null() => out.push(path),
                    None => {}
                }
            }
        }
        (serde_json::Value::Array(raw_items), serde_json::Value::Array(parsed_items)) => {
            for (i, (raw_child, parsed_child)) in
                raw_items.iter().zip(parsed_items).enumerate()
            {
                collect_unknown(raw_child, parsed_child, format!("{prefix}.{i}"), out);
            }
        }
        _ => {}
    }
}
