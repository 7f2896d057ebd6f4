//! Core types for the generation backend abstraction

use async_trait::async_trait;
use std::time::Duration;

use sermon_utils::error::LlmError;

/// One request to a text-generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmInvocation {
    /// Model to use for this invocation
    pub model: String,
    /// Role-defining instruction, constant per stage
    pub system_instruction: String,
    /// Stage-specific content prompt
    pub user_instruction: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Transport timeout for this single request
    pub timeout: Duration,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        system_instruction: impl Into<String>,
        user_instruction: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_instruction: system_instruction.into(),
            user_instruction: user_instruction.into(),
            max_output_tokens: 8192,
            temperature: 0.7,
            timeout: Duration::from_secs(300),
        }
    }

    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result from a backend invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResult {
    /// Generated text, never empty
    pub text: String,
    /// Provider name (e.g., "gemini")
    pub provider: String,
    /// Model that was actually used
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
    /// Provider's stop reason, when reported
    pub finish_reason: Option<String>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
            finish_reason: None,
        }
    }

    /// Record token usage; providers may report either count alone.
    #[must_use]
    pub fn with_tokens(mut self, input: Option<u64>, output: Option<u64>) -> Self {
        self.tokens_input = input;
        self.tokens_output = output;
        self
    }

    #[must_use]
    pub fn with_finish_reason(mut self, reason: Option<String>) -> Self {
        self.finish_reason = reason;
        self
    }
}

/// A single-shot text-generation provider.
///
/// Backends perform exactly one request per call; retry policy lives in
/// [`crate::RetryingClient`].
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// # Errors
    ///
    /// Returns `LlmError` for transport failures, provider status errors,
    /// timeouts and unusable responses.
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}
