//! Shared HTTP client for HTTP-based generation providers
//!
//! A single `reqwest::Client` is configured once per process and reused across
//! every stage of a run. This layer performs exactly one request per call and
//! maps failures onto [`LlmError`]; retry policy belongs to the caller.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use sermon_utils::error::LlmError;
use sermon_utils::redaction::redact_secrets;

/// Default maximum HTTP timeout (5 minutes)
pub(crate) const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest provider error message kept in an `LlmError`.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

#[derive(Clone, Debug)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    max_timeout: Duration,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn with_max_timeout(max_timeout: Duration) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client: Arc::new(client),
            max_timeout,
        })
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Execute one request with timeout `min(request_timeout, max_timeout)`.
    ///
    /// Non-success statuses are mapped as follows:
    /// - 401/403 → `LlmError::ProviderAuth`
    /// - 429 → `LlmError::ProviderQuota`
    /// - 5xx → `LlmError::ProviderOutage`
    /// - other → `LlmError::Provider`
    ///
    /// Every mapped message carries the numeric status code.
    pub async fn execute(
        &self,
        request_builder: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        let request = request_builder
            .timeout(effective_timeout)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build request: {e}")))?;

        debug!(
            provider = provider_name,
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(LlmError::Timeout {
                    duration: effective_timeout,
                });
            }
            Err(e) => {
                return Err(LlmError::Transport(format!(
                    "{provider_name} request failed: {}",
                    redact_secrets(&error_chain(&e))
                )));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, &body, provider_name))
    }
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Map a non-success status and its body to an `LlmError`.
pub(crate) fn map_status_error(status: StatusCode, body: &str, provider_name: &str) -> LlmError {
    let detail = provider_detail(body);
    let message = if detail.is_empty() {
        format!("{provider_name} returned {status}")
    } else {
        format!("{provider_name} returned {status}: {detail}")
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::ProviderAuth(message),
        StatusCode::TOO_MANY_REQUESTS => LlmError::ProviderQuota(message),
        s if s.is_server_error() => LlmError::ProviderOutage(message),
        s => LlmError::Provider {
            status: s.as_u16(),
            message,
        },
    }
}

fn provider_detail(body: &str) -> String {
    let raw = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(code) if !parsed.error.message.is_empty() => {
                format!("{} ({code})", parsed.error.message)
            }
            _ => parsed.error.message,
        },
        Err(_) => body.trim().to_string(),
    };
    let truncated: String = raw.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
    redact_secrets(&truncated)
}

/// `Display` of a reqwest error plus its sources, so OS-level causes such as
/// "connection refused" stay visible to the retry classifier.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
