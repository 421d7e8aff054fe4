//! Provider-level configuration: credentials, endpoint, and retry behavior,
//! with environment-variable fallbacks. Precedence is explicit option >
//! environment > error when required.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::diag::{Diagnostic, Diagnostics};
use crate::schema::{AttributeSchema, ResourceSchema};
use crate::value::{AttrPath, Value};

use super::client::ApiRequest;
use super::error::translate_api_error;
use super::ApiClient;

pub const API_KEY_ENV: &str = "DD_API_KEY";
pub const APP_KEY_ENV: &str = "DD_APP_KEY";
pub const HOST_ENVS: [&str; 2] = ["DATADOG_HOST", "DD_HOST"];

const DEFAULT_API_URL: &str = "https://api.datadoghq.com";

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub app_key: String,
    pub api_url: String,
    /// When false, credentials are not pre-flight checked and may be empty.
    pub validate: bool,
    pub http_retry_enabled: bool,
    pub http_retry_timeout: Duration,
}

/// Schema published to the host for the provider block itself.
pub fn provider_schema() -> ResourceSchema {
    ResourceSchema::new([
        ("api_key", AttributeSchema::string().sensitive()),
        ("app_key", AttributeSchema::string().sensitive()),
        ("api_url", AttributeSchema::string()),
        (
            "validate",
            AttributeSchema::bool().default_value(Value::Bool(true)),
        ),
        (
            "http_client_retry_enabled",
            AttributeSchema::bool().default_value(Value::Bool(true)),
        ),
        (
            "http_client_retry_timeout",
            AttributeSchema::int().default_value(Value::Int(60)),
        ),
    ])
}

impl ProviderConfig {
    /// Resolve the provider block against the environment. `options` is the
    /// configured value tree for the provider block (may be an empty
    /// object).
    pub fn resolve(options: &Value) -> Result<ProviderConfig, Diagnostics> {
        let get_str = |name: &str| -> Option<String> {
            options
                .get(&AttrPath::attr(name))
                .and_then(|v| v.as_str().map(str::to_string))
                .filter(|s| !s.is_empty())
        };
        let get_bool = |name: &str, default: bool| -> bool {
            options
                .get(&AttrPath::attr(name))
                .and_then(Value::as_bool)
                .unwrap_or(default)
        };

        let api_key = get_str("api_key").or_else(|| env_non_empty(API_KEY_ENV));
        let app_key = get_str("app_key").or_else(|| env_non_empty(APP_KEY_ENV));
        let api_url = get_str("api_url")
            .or_else(|| HOST_ENVS.iter().find_map(|name| env_non_empty(name)))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let validate = get_bool("validate", true);

        if validate && (api_key.is_none() || app_key.is_none()) {
            return Err(Diagnostics::from_error(
                "api_key and app_key must be set unless validate = false",
            ));
        }

        let retry_timeout_secs = options
            .get(&AttrPath::attr("http_client_retry_timeout"))
            .and_then(Value::as_int)
            .unwrap_or(60);

        Ok(ProviderConfig {
            api_key: api_key.unwrap_or_default(),
            app_key: app_key.unwrap_or_default(),
            api_url,
            validate,
            http_retry_enabled: get_bool("http_client_retry_enabled", true),
            http_retry_timeout: Duration::from_secs(retry_timeout_secs.max(0) as u64),
        })
    }

    /// Pre-flight credential check against `/api/v1/validate`. Skipped when
    /// `validate = false`.
    pub async fn preflight(&self, client: &ApiClient) -> Diagnostics {
        if !self.validate {
            info!("skipping credential validation (validate = false)");
            return Diagnostics::new();
        }
        let cancel = CancellationToken::new();
        match client.send(ApiRequest::get("/api/v1/validate"), &cancel).await {
            Ok(response) if response.ok() => {
                info!("credentials validated");
                Diagnostics::new()
            }
            Ok(response) => {
                translate_api_error(None, Some(&response), "error validating provider credentials")
                    .into()
            }
            Err(err) => {
                Diagnostic::error("error validating provider credentials")
                    .with_detail(err.to_string())
                    .into()
            }
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
