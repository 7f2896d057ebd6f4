//! Bounded exponential-backoff retry around a single-shot backend.
//!
//! Classification is two-tier: structural first (transport faults), then
//! textual (status codes, then transient-failure vocabulary). Anything else is
//! fatal and fails on the attempt that produced it.

use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use sermon_config::{Config, RetrySettings};
use sermon_utils::error::{GenerationError, LlmError};
use sermon_utils::progress::{ProgressReporter, TracingReporter};
use sermon_utils::redaction::redact_secrets;

use crate::types::{LlmBackend, LlmInvocation};

/// Status codes that indicate a transient provider condition.
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Transient-failure vocabulary, matched case-insensitively against the error
/// text. Covers English and Korean transport messages and Windows socket
/// errors.
pub const RETRYABLE_KEYWORDS: [&str; 11] = [
    "timeout",
    "connection",
    "unavailable",
    "temporarily",
    "service unavailable",
    "deadline exceeded",
    "연결",
    "응답이 없",
    "시간 초과",
    "끊어졌",
    "winerror",
];

/// Why an error was judged retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// Connection failure, reset or timeout below HTTP.
    TransportFault,
    /// Error text names a retryable status code.
    Status(u16),
    /// Error text contains transient-failure vocabulary.
    Keyword(&'static str),
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportFault => write!(f, "transport fault"),
            Self::Status(code) => write!(f, "status {code}"),
            Self::Keyword(keyword) => write!(f, "transient error '{keyword}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retryable(RetryReason),
    Fatal,
}

/// Classify a failed attempt.
#[must_use]
pub fn classify(error: &LlmError) -> RetryDecision {
    if error.is_transport_fault() {
        return RetryDecision::Retryable(RetryReason::TransportFault);
    }

    let text = error.to_string();
    if let Some(code) = RETRYABLE_STATUS_CODES
        .iter()
        .find(|code| text.contains(&code.to_string()))
    {
        return RetryDecision::Retryable(RetryReason::Status(*code));
    }

    let lowered = text.to_lowercase();
    if let Some(keyword) = RETRYABLE_KEYWORDS
        .iter()
        .find(|keyword| lowered.contains(*keyword))
    {
        return RetryDecision::Retryable(RetryReason::Keyword(*keyword));
    }

    RetryDecision::Fatal
}

/// Attempt cap and delay schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay: settings.initial_delay(),
            backoff_factor: settings.backoff_factor,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1-based): `initial * factor^(retry-1)`.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        self.initial_delay
            .mul_f64(self.backoff_factor.powi(exponent).min(1e6))
    }
}

/// Suspends the current task between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|delays| delays.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

/// Anything that turns a (system, user) instruction pair into text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerationError` on a fatal fault or after exhausting retries.
    /// Partial output is never returned.
    async fn generate(
        &self,
        system_instruction: &str,
        user_instruction: &str,
    ) -> Result<String, GenerationError>;
}

/// Per-request generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl From<&Config> for GenerationSettings {
    fn from(config: &Config) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_output_tokens: config.llm.max_output_tokens,
            temperature: config.llm.temperature,
            timeout: config.llm.request_timeout(),
        }
    }
}

/// [`Generator`] that retries transient backend failures with exponential backoff.
pub struct RetryingClient {
    backend: Arc<dyn LlmBackend>,
    settings: GenerationSettings,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    reporter: Arc<dyn ProgressReporter>,
}

impl RetryingClient {
    #[must_use]
    pub fn new(backend: Arc<dyn LlmBackend>, settings: GenerationSettings) -> Self {
        Self {
            backend,
            settings,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            reporter: Arc::new(TracingReporter),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl Generator for RetryingClient {
    async fn generate(
        &self,
        system_instruction: &str,
        user_instruction: &str,
    ) -> Result<String, GenerationError> {
        let invocation = LlmInvocation::new(
            self.settings.model.clone(),
            system_instruction,
            user_instruction,
        )
        .with_max_output_tokens(self.settings.max_output_tokens)
        .with_temperature(self.settings.temperature)
        .with_timeout(self.settings.timeout);

        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 1;

        loop {
            let error = match self.backend.invoke(invocation.clone()).await {
                Ok(result) => {
                    debug!(attempt, model = %result.model_used, "Generation succeeded");
                    return Ok(result.text);
                }
                Err(error) => error,
            };

            let reason = match classify(&error) {
                RetryDecision::Fatal => {
                    warn!(
                        attempt,
                        error = %redact_secrets(&error.to_string()),
                        "Generation failed with a non-retryable error"
                    );
                    return Err(GenerationError::Fatal {
                        attempt,
                        source: error,
                    });
                }
                RetryDecision::Retryable(reason) => reason,
            };

            if attempt >= max_attempts {
                warn!(
                    attempts = attempt,
                    error = %redact_secrets(&error.to_string()),
                    "Generation retries exhausted"
                );
                return Err(GenerationError::RetriesExhausted {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.policy.delay_for(attempt);
            self.reporter
                .retry_scheduled(attempt, max_attempts, delay, &reason.to_string());
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LlmResult;
    use proptest::prelude::*;
    use sermon_utils::progress::RecordingReporter;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend that replays a fixed script of outcomes.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<LlmResult, LlmError>>>,
        calls: AtomicU32,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<LlmResult, LlmError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Misconfiguration("script exhausted".into())))
        }
    }

    fn ok(text: &str) -> Result<LlmResult, LlmError> {
        Ok(LlmResult::new(text, "scripted", "test-model"))
    }

    fn outage() -> Result<LlmResult, LlmError> {
        Err(LlmError::ProviderOutage(
            "gemini returned 503 Service Unavailable".into(),
        ))
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            model: "test-model".into(),
            max_output_tokens: 100,
            temperature: 0.7,
            timeout: Duration::from_secs(5),
        }
    }

    fn client(
        backend: Arc<ScriptedBackend>,
    ) -> (RetryingClient, Arc<RecordingSleeper>, Arc<RecordingReporter>) {
        let sleeper = Arc::new(RecordingSleeper::new());
        let reporter = Arc::new(RecordingReporter::new());
        let client = RetryingClient::new(backend, settings())
            .with_sleeper(sleeper.clone())
            .with_reporter(reporter.clone());
        (client, sleeper, reporter)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_never_sleeps() {
        let backend = Arc::new(ScriptedBackend::new(vec![ok("done")]));
        let (client, sleeper, _) = client(backend.clone());

        assert_eq!(client.generate("sys", "user").await.unwrap(), "done");
        assert_eq!(backend.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_then_success_uses_backoff_schedule() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            outage(),
            Err(LlmError::Transport("connection reset by peer".into())),
            outage(),
            ok("recovered"),
        ]));
        let (client, sleeper, reporter) = client(backend.clone());

        assert_eq!(client.generate("sys", "user").await.unwrap(), "recovered");
        assert_eq!(backend.calls(), 4);
        let expected = vec![
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
        ];
        assert_eq!(sleeper.delays(), expected);
        assert_eq!(reporter.retry_delays(), expected);
    }

    #[tokio::test]
    async fn test_retries_exhausted_after_four_attempts() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            outage(),
            outage(),
            outage(),
            outage(),
            ok("never reached"),
        ]));
        let (client, sleeper, _) = client(backend.clone());

        let err = client.generate("sys", "user").await.unwrap_err();
        match err {
            GenerationError::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 4);
                assert!(matches!(source, LlmError::ProviderOutage(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(backend.calls(), 4);
        assert_eq!(sleeper.delays().len(), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_is_fatal_without_sleeping() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(LlmError::ProviderAuth(
                "gemini returned 401 Unauthorized: API key not valid".into(),
            )),
            ok("never reached"),
        ]));
        let (client, sleeper, reporter) = client(backend.clone());

        let err = client.generate("sys", "user").await.unwrap_err();
        assert!(matches!(err, GenerationError::Fatal { attempt: 1, .. }));
        assert_eq!(backend.calls(), 1);
        assert!(sleeper.delays().is_empty());
        assert!(reporter.events().is_empty());
    }

    #[tokio::test]
    async fn test_fatal_after_retryable_reports_its_attempt() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            outage(),
            Err(LlmError::InvalidResponse("Gemini response has no candidates".into())),
        ]));
        let (client, sleeper, _) = client(backend);

        let err = client.generate("sys", "user").await.unwrap_err();
        assert!(matches!(err, GenerationError::Fatal { attempt: 2, .. }));
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_zero_retries_policy_fails_immediately() {
        let backend = Arc::new(ScriptedBackend::new(vec![outage(), ok("x")]));
        let (client, sleeper, _) = client(backend.clone());
        let client = client.with_policy(RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        });

        let err = client.generate("sys", "user").await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::RetriesExhausted { attempts: 1, .. }
        ));
        assert!(sleeper.delays().is_empty());
    }

    #[test]
    fn test_classify_structural_before_textual() {
        assert_eq!(
            classify(&LlmError::Timeout {
                duration: Duration::from_secs(300)
            }),
            RetryDecision::Retryable(RetryReason::TransportFault)
        );
        assert_eq!(
            classify(&LlmError::Transport("dns failure".into())),
            RetryDecision::Retryable(RetryReason::TransportFault)
        );
    }

    #[test]
    fn test_classify_status_codes_in_text() {
        assert_eq!(
            classify(&LlmError::Misconfiguration("upstream said 503".into())),
            RetryDecision::Retryable(RetryReason::Status(503))
        );
        assert_eq!(
            classify(&LlmError::ProviderQuota("gemini returned 429 Too Many Requests".into())),
            RetryDecision::Retryable(RetryReason::Status(429))
        );
    }

    #[test]
    fn test_classify_keywords_case_insensitive_and_korean() {
        assert_eq!(
            classify(&LlmError::InvalidResponse("Service Temporarily overloaded".into())),
            RetryDecision::Retryable(RetryReason::Keyword("temporarily"))
        );
        assert_eq!(
            classify(&LlmError::Provider {
                status: 400,
                message: "서버 연결이 끊어졌습니다".into()
            }),
            RetryDecision::Retryable(RetryReason::Keyword("연결"))
        );
        assert_eq!(
            classify(&LlmError::InvalidResponse("WinError 10054".into())),
            RetryDecision::Retryable(RetryReason::Keyword("winerror"))
        );
    }

    #[test]
    fn test_classify_fatal() {
        assert_eq!(
            classify(&LlmError::ProviderAuth("gemini returned 403 Forbidden".into())),
            RetryDecision::Fatal
        );
        assert_eq!(
            classify(&LlmError::Provider {
                status: 400,
                message: "gemini returned 400 Bad Request: Invalid model name".into()
            }),
            RetryDecision::Fatal
        );
    }

    #[test]
    fn test_policy_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_policy_from_settings() {
        let settings = RetrySettings {
            max_retries: 1,
            initial_delay_secs: 0.5,
            backoff_factor: 3.0,
        };
        let policy = RetryPolicy::from(&settings);
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay_for(2), Duration::from_millis(1500));
    }

    proptest! {
        #[test]
        fn prop_any_message_with_retryable_status_is_retryable(
            prefix in "[a-z ]{0,20}",
            code in proptest::sample::select(RETRYABLE_STATUS_CODES.to_vec()),
            suffix in "[a-z ]{0,20}",
        ) {
            let err = LlmError::ProviderAuth(format!("{prefix}{code}{suffix}"));
            prop_assert!(matches!(classify(&err), RetryDecision::Retryable(_)));
        }

        #[test]
        fn prop_transport_faults_always_retryable(message in ".{0,80}") {
            let err = LlmError::Transport(message);
            prop_assert_eq!(
                classify(&err),
                RetryDecision::Retryable(RetryReason::TransportFault)
            );
        }

        #[test]
        fn prop_delays_never_shrink(initial_ms in 1u64..5_000, factor in 1.0f64..4.0, retry in 1u32..8) {
            let policy = RetryPolicy {
                max_retries: 8,
                initial_delay: Duration::from_millis(initial_ms),
                backoff_factor: factor,
            };
            prop_assert!(policy.delay_for(retry + 1) >= policy.delay_for(retry));
        }
    }
}
