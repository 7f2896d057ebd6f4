//! Error taxonomy for sermon-auto.
//!
//! Each concern has its own `thiserror` enum; [`SermonError`] wraps them at the
//! application boundary. Every error implements [`UserFriendlyError`] so the CLI
//! can render an `Error / Context / Suggestions` block and pick an exit code.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::exit_codes::ExitCode;
use crate::redaction::redact_secrets;
use crate::types::StageId;

/// User-facing rendering of an error.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Generation,
    FileSystem,
    Export,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Validation => write!(f, "Validation"),
            Self::Generation => write!(f, "Generation"),
            Self::FileSystem => write!(f, "File System"),
            Self::Export => write!(f, "Export"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    #[error("API key environment variable {env_var} is not set")]
    MissingApiKey { env_var: String },

    #[error("API key in {env_var} is still the placeholder value")]
    PlaceholderApiKey { env_var: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration discovery failed: {0}")]
    DiscoveryFailed(String),
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("Configuration file could not be parsed: {msg}"),
            Self::NotFound { path } => format!("Configuration file '{path}' does not exist"),
            Self::MissingApiKey { env_var } => {
                format!("No Gemini API key found in environment variable {env_var}")
            }
            Self::PlaceholderApiKey { env_var } => {
                format!("{env_var} still contains the placeholder API key")
            }
            Self::InvalidValue { key, value } => {
                format!("Configuration value '{value}' is not valid for '{key}'")
            }
            Self::DiscoveryFailed(msg) => format!("Could not locate configuration: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::MissingApiKey { .. } | Self::PlaceholderApiKey { .. } => Some(
                "A valid API key is required before any generation request is sent.".to_string(),
            ),
            Self::InvalidFile(_) => {
                Some("Configuration files use TOML with [llm], [retry], [paths] and [history] sections.".to_string())
            }
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingApiKey { env_var } | Self::PlaceholderApiKey { env_var } => vec![
                format!("Export your key: export {env_var}=<your key>"),
                "Create a key at https://aistudio.google.com/app/apikey".to_string(),
                "Set [llm] api_key_env if the key lives in a different variable".to_string(),
            ],
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of .sermon-auto/config.toml".to_string(),
                "Run 'sermon-auto config' to see the effective configuration".to_string(),
            ],
            Self::NotFound { .. } => {
                vec!["Check the path passed to --config".to_string()]
            }
            Self::InvalidValue { key, .. } => {
                vec![format!("Correct the '{key}' setting and try again")]
            }
            Self::DiscoveryFailed(_) => {
                vec!["Pass an explicit configuration file with --config".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Run request validation errors, raised before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Bible passage reference is empty")]
    EmptyRange,

    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Invalid {field} '{value}'")]
    InvalidOption { field: String, value: String },
}

impl UserFriendlyError for InputError {
    fn user_message(&self) -> String {
        match self {
            Self::EmptyRange => "A Bible passage reference is required".to_string(),
            Self::InvalidDate { value } => format!("'{value}' is not a valid date"),
            Self::InvalidOption { field, value } => format!("'{value}' is not a valid {field}"),
        }
    }

    fn context(&self) -> Option<String> {
        None
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::EmptyRange => vec!["Pass a passage such as --range \"Ezekiel 36\"".to_string()],
            Self::InvalidDate { .. } => vec!["Use the format YYYY-MM-DD, e.g. 2026-03-01".to_string()],
            Self::InvalidOption { field, .. } => {
                vec![format!("Run 'sermon-auto run --help' for accepted {field} values")]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

/// Errors that can occur during a single generation request
#[derive(Debug, Error)]
pub enum LlmError {
    /// Connection failure or other transport-level fault
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded the transport timeout
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// 401/403
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// 429
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// 5xx
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Any other non-success status
    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// Response body missing the generated text or not decodable
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),
}

impl LlmError {
    /// Whether this fault happened below HTTP (connect, reset, timeout).
    #[must_use]
    pub fn is_transport_fault(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("Could not reach the generation service: {msg}"),
            Self::Timeout { duration } => {
                format!("Generation request timed out after {duration:?}")
            }
            Self::ProviderAuth(msg) => format!("Generation service rejected the API key: {msg}"),
            Self::ProviderQuota(msg) => format!("Generation service quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("Generation service is unavailable: {msg}"),
            Self::Provider { status, message } => {
                format!("Generation service returned {status}: {message}")
            }
            Self::InvalidResponse(msg) => format!("Generation service response was unusable: {msg}"),
            Self::Misconfiguration(msg) => format!("Generation client misconfigured: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate a missing, revoked or invalid API key.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) | Self::Transport(_) | Self::Timeout { .. } => {
                Some("Transient failures are retried with exponential backoff.".to_string())
            }
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ProviderAuth(_) => vec!["Check the value of GEMINI_API_KEY".to_string()],
            Self::ProviderQuota(_) => vec!["Wait a few minutes and run again".to_string()],
            Self::ProviderOutage(_) | Self::Transport(_) | Self::Timeout { .. } => vec![
                "Check network connectivity".to_string(),
                "Increase [retry] max_retries or [llm] request_timeout_secs".to_string(),
            ],
            Self::Provider { .. } | Self::InvalidResponse(_) => {
                vec!["Check that [llm] model names an available Gemini model".to_string()]
            }
            Self::Misconfiguration(_) => {
                vec!["Run 'sermon-auto config' to inspect the effective settings".to_string()]
            }
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Misconfiguration(_) => ErrorCategory::Configuration,
            _ => ErrorCategory::Generation,
        }
    }
}

/// Terminal outcome of the retrying generation client.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Non-retryable failure; no further attempts were made.
    #[error("generation failed on attempt {attempt}: {source}")]
    Fatal {
        attempt: u32,
        #[source]
        source: LlmError,
    },

    /// Every attempt failed with a retryable error.
    #[error("generation failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: LlmError,
    },
}

impl GenerationError {
    /// The last error observed from the service.
    #[must_use]
    pub fn last_error(&self) -> &LlmError {
        match self {
            Self::Fatal { source, .. } | Self::RetriesExhausted { source, .. } => source,
        }
    }

    /// Number of attempts made before giving up.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Fatal { attempt, .. } => *attempt,
            Self::RetriesExhausted { attempts, .. } => *attempts,
        }
    }
}

impl UserFriendlyError for GenerationError {
    fn user_message(&self) -> String {
        match self {
            Self::Fatal { source, .. } => source.user_message(),
            Self::RetriesExhausted { attempts, source } => {
                format!("{} (gave up after {attempts} attempts)", source.user_message())
            }
        }
    }

    fn context(&self) -> Option<String> {
        self.last_error().context()
    }

    fn suggestions(&self) -> Vec<String> {
        self.last_error().suggestions()
    }

    fn category(&self) -> ErrorCategory {
        self.last_error().category()
    }
}

/// Top-level error type for sermon-auto operations.
#[derive(Error, Debug)]
pub enum SermonError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("Stage {stage} failed: {source}")]
    Stage {
        stage: StageId,
        #[source]
        source: GenerationError,
    },

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Failed to persist {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error("Export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UserFriendlyError for SermonError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Input(e) => e.user_message(),
            Self::Stage { stage, source } => format!(
                "Stage {} ({}) failed: {}",
                stage.index(),
                stage.display_name(),
                source.user_message()
            ),
            Self::Generation(e) => e.user_message(),
            Self::Llm(e) => e.user_message(),
            Self::Persistence { path, reason } => format!("Could not write '{path}': {reason}"),
            Self::Export(msg) => format!("Document export failed: {msg}"),
            Self::Io(e) => format!("File system error: {e}"),
            Self::Other(e) => format!("{e:#}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.context(),
            Self::Input(e) => e.context(),
            Self::Stage { source, .. } | Self::Generation(source) => source.context(),
            Self::Llm(e) => e.context(),
            Self::Persistence { .. } | Self::Io(_) => {
                Some("Stage outputs are written atomically; nothing was half-written.".to_string())
            }
            Self::Export(_) => Some("Stage artifacts are still available in the run directory.".to_string()),
            Self::Other(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(e) => e.suggestions(),
            Self::Input(e) => e.suggestions(),
            Self::Stage { source, .. } | Self::Generation(source) => source.suggestions(),
            Self::Llm(e) => e.suggestions(),
            Self::Persistence { .. } | Self::Io(_) => vec![
                "Check permissions on the output directory".to_string(),
                "Check available disk space".to_string(),
            ],
            Self::Export(_) => vec!["Re-run with --no-export to skip the document step".to_string()],
            Self::Other(_) => vec!["Re-run with --verbose for details".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(e) => e.category(),
            Self::Input(e) => e.category(),
            Self::Stage { source, .. } | Self::Generation(source) => source.category(),
            Self::Llm(e) => e.category(),
            Self::Persistence { .. } | Self::Io(_) | Self::Other(_) => ErrorCategory::FileSystem,
            Self::Export(_) => ErrorCategory::Export,
        }
    }
}

impl SermonError {
    /// Render the error with context and suggestions, secrets redacted.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = format!("Error: {}\n", self.user_message());

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {ctx}\n"));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        redact_secrets(&output)
    }

    /// Map this error to the CLI exit code.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) | Self::Input(_) => ExitCode::CLI_ARGS,
            Self::Stage { .. } | Self::Generation(_) => ExitCode::GENERATION_FAILURE,
            Self::Llm(LlmError::Misconfiguration(_)) => ExitCode::CLI_ARGS,
            Self::Llm(_) => ExitCode::GENERATION_FAILURE,
            Self::Persistence { .. } | Self::Export(_) | Self::Io(_) | Self::Other(_) => {
                ExitCode::INTERNAL
            }
        }
    }
}
