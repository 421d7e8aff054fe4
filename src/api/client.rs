//! Authenticated, retrying HTTP access to the Datadog API. The `Transport`
//! trait is the seam between the client and the wire so tests can run
//! against an in-memory fake.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::ProviderConfig;
use super::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        write!(f, "{s}")
    }
}

/// One API call. `path` is relative to the configured base URL and carries
/// the version prefix (`/api/v1/...` or `/api/v2/...`).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest {
            method: Method::Put,
            path: path.into(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        ApiRequest {
            method: Method::Delete,
            path: path.into(),
            body: None,
        }
    }

    pub fn delete_with_body(path: impl Into<String>, body: serde_json::Value) -> Self {
        ApiRequest {
            method: Method::Delete,
            path: path.into(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Wire access. Implementations must be safe to share across tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Production transport over reqwest with Datadog auth headers.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    app_key: String,
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig) -> Self {
        HttpTransport {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            app_key: config.app_key.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = match request.method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        };
        builder = builder
            .header("DD-API-KEY", &self.api_key)
            .header("DD-APPLICATION-KEY", &self.app_key);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Connection(e.to_string()))?;
        let body = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };
        Ok(ApiResponse { status, body })
    }
}

/// Retrying, cancellable client handed to adapters through the meta object.
/// Retries 429 and 5xx with exponential backoff, capped by the configured
/// retry budget; 4xx is surfaced immediately.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    retry_enabled: bool,
    retry_timeout: Duration,
    base_delay: Duration,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, config: &ProviderConfig) -> Self {
        ApiClient {
            transport,
            retry_enabled: config.http_retry_enabled,
            retry_timeout: config.http_retry_timeout,
            base_delay: Duration::from_millis(500),
        }
    }

    /// A client that never retries, for tests exercising raw status flow.
    pub fn without_retry(transport: Arc<dyn Transport>) -> Self {
        ApiClient {
            transport,
            retry_enabled: false,
            retry_timeout: Duration::ZERO,
            base_delay: Duration::from_millis(1),
        }
    }

    pub async fn send(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, ApiError> {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ApiError::Cancelled);
            }
            debug!(method = %request.method, path = %request.path, attempt, "api call");
            let response = tokio::select! {
                r = self.transport.send(request.clone()) => r?,
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            };

            let retryable = response.status == 429 || response.status >= 500;
            if !retryable || !self.retry_enabled {
                return Ok(response);
            }

            attempt += 1;
            let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
            if started.elapsed() + delay > self.retry_timeout {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status,
                    attempts = attempt,
                    "retry budget exhausted"
                );
                return Ok(response);
            }
            warn!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying after transient failure"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyTransport {
        failures: AtomicU32,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, ApiError> {
            if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n > 0).then(|| n - 1)
            }).is_ok()
            {
                Ok(ApiResponse {
                    status: 429,
                    body: serde_json::Value::Null,
                })
            } else {
                Ok(ApiResponse {
                    status: 200,
                    body: serde_json::json!({"ok": true}),
                })
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_429_until_success() {
        let transport = Arc::new(FlakyTransport {
            failures: AtomicU32::new(2),
        });
        let client = ApiClient {
            transport,
            retry_enabled: true,
            retry_timeout: Duration::from_secs(60),
            base_delay: Duration::from_millis(10),
        };
        let response = client
            .send(ApiRequest::get("/api/v1/validate"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn disabled_retry_returns_first_response() {
        let transport = Arc::new(FlakyTransport {
            failures: AtomicU32::new(5),
        });
        let client = ApiClient::without_retry(transport);
        let response = client
            .send(ApiRequest::get("/api/v1/validate"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.status, 429);
    }

    #[tokio::test]
    async fn cancellation_aborts_promptly() {
        let transport = Arc::new(FlakyTransport {
            failures: AtomicU32::new(0),
        });
        let client = ApiClient::without_retry(transport);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client
            .send(ApiRequest::get("/api/v1/validate"), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
    }
}
