//! Gemini `generateContent` HTTP backend
//!
//! `POST {base_url}/models/{model}:generateContent` with the API key in the
//! `x-goog-api-key` header, so the key never appears in a URL that could be
//! echoed back in an error message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use sermon_config::Config;
use sermon_utils::error::{ConfigError, LlmError};

use crate::http_client::{DEFAULT_MAX_HTTP_TIMEOUT, HttpClient};
use crate::types::{LlmBackend, LlmInvocation, LlmResult};

const PROVIDER: &str = "gemini";

#[derive(Clone, Debug)]
pub struct GeminiBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
}

impl GeminiBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_max_timeout(api_key, base_url, DEFAULT_MAX_HTTP_TIMEOUT)
    }

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn with_max_timeout(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        max_timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::with_max_timeout(max_timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Build a backend from validated configuration.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the API key is missing or still
    /// the placeholder, before any network traffic.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?;
        Self::with_max_timeout(api_key, &config.llm.base_url, config.llm.request_timeout())
            .map_err(|e| ConfigError::InvalidValue {
                key: "llm".to_string(),
                value: e.to_string(),
            })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn request_body(inv: &LlmInvocation) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: inv.user_instruction.clone(),
                }],
            }],
            system_instruction: (!inv.system_instruction.is_empty()).then(|| Content {
                role: None,
                parts: vec![Part {
                    text: inv.system_instruction.clone(),
                }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: inv.max_output_tokens,
                temperature: inv.temperature,
            },
        }
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        debug!(
            provider = PROVIDER,
            model = %inv.model,
            max_output_tokens = inv.max_output_tokens,
            temperature = inv.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Gemini backend"
        );

        let request = self
            .client
            .post(&self.endpoint(&inv.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(&inv));

        let response = self.client.execute(request, inv.timeout, PROVIDER).await?;

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout {
                    duration: inv.timeout,
                }
            } else if e.is_decode() {
                LlmError::InvalidResponse(format!("Failed to parse Gemini response: {e}"))
            } else {
                LlmError::Transport(format!("Failed to read Gemini response: {e}"))
            }
        })?;

        into_result(body, &inv.model)
    }
}

fn into_result(body: GenerateContentResponse, model: &str) -> Result<LlmResult, LlmError> {
    let Some(candidate) = body.candidates.into_iter().next() else {
        let reason = body
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!(" (blockReason: {reason})"))
            .unwrap_or_default();
        return Err(LlmError::InvalidResponse(format!(
            "Gemini response has no candidates{reason}"
        )));
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse(format!(
            "Gemini returned empty text (finishReason: {})",
            candidate.finish_reason.as_deref().unwrap_or("none")
        )));
    }

    if candidate.finish_reason.as_deref() == Some("MAX_TOKENS") {
        warn!(provider = PROVIDER, model, "Output truncated at max_output_tokens");
    }

    let usage = body.usage_metadata.unwrap_or_default();
    let result = LlmResult::new(
        text,
        PROVIDER,
        body.model_version.unwrap_or_else(|| model.to_string()),
    )
    .with_tokens(usage.prompt_token_count, usage.candidates_token_count)
    .with_finish_reason(candidate.finish_reason);

    debug!(
        provider = PROVIDER,
        tokens_input = ?result.tokens_input,
        tokens_output = ?result.tokens_output,
        "Gemini invocation completed"
    );

    Ok(result)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}
