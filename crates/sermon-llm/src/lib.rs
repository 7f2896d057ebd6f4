//! Text-generation backends and the retrying generation client
//!
//! Backends implement [`LlmBackend`] and perform a single request per call.
//! [`RetryingClient`] wraps a backend with bounded exponential-backoff retry
//! and exposes the [`Generator`] seam the pipeline depends on.

mod gemini_backend;
pub(crate) mod http_client;
mod retry;
mod types;

use std::sync::Arc;

pub use gemini_backend::GeminiBackend;
pub use retry::{
    GenerationSettings, Generator, RETRYABLE_KEYWORDS, RETRYABLE_STATUS_CODES, RecordingSleeper,
    RetryDecision, RetryPolicy, RetryReason, RetryingClient, Sleeper, TokioSleeper, classify,
};
pub use sermon_utils::error::{GenerationError, LlmError};
pub use types::{LlmBackend, LlmInvocation, LlmResult};

use sermon_config::Config;
use sermon_utils::error::ConfigError;
use sermon_utils::progress::ProgressReporter;

/// Build the production generator: Gemini over HTTPS with the configured
/// retry policy, reporting retries to `reporter`.
///
/// # Errors
///
/// Fails before any network traffic when the API key is missing or invalid.
pub fn generator_from_config(
    config: &Config,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RetryingClient, ConfigError> {
    let backend = GeminiBackend::from_config(config)?;
    Ok(
        RetryingClient::new(Arc::new(backend), GenerationSettings::from(config))
            .with_policy(RetryPolicy::from(&config.retry))
            .with_reporter(reporter),
    )
}
