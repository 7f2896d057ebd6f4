use std::collections::BTreeMap;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use sermon_utils::types::ConfigSource;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY_SECS: f64 = 2.0;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_FEEDBACK_DIR: &str = "feedback";
pub const DEFAULT_HISTORY_ENTRIES: usize = 5;

/// Value shipped in `.env.example`; treated the same as an unset key.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// Environment variable overriding `[llm] model`.
pub const MODEL_ENV: &str = "GEMINI_MODEL";
/// Environment variable overriding `[paths] output_dir`.
pub const OUTPUT_DIR_ENV: &str = "SERMON_AUTO_OUTPUT_DIR";
/// Environment variable overriding `[paths] feedback_dir`.
pub const FEEDBACK_DIR_ENV: &str = "SERMON_AUTO_FEEDBACK_DIR";

/// Effective configuration after discovery.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub retry: RetrySettings,
    pub paths: PathSettings,
    pub history: HistorySettings,
    /// Key read from the environment variable named by `llm.api_key_env`.
    pub(crate) api_key: Option<String>,
    /// File the values were loaded from, if any.
    pub config_path: Option<Utf8PathBuf>,
    pub source_attribution: BTreeMap<String, ConfigSource>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub api_key_env: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl LlmSettings {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub initial_delay_secs: f64,
    pub backoff_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_secs: DEFAULT_INITIAL_DELAY_SECS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetrySettings {
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs_f64(self.initial_delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSettings {
    pub output_dir: Utf8PathBuf,
    pub feedback_dir: Utf8PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
            feedback_dir: Utf8PathBuf::from(DEFAULT_FEEDBACK_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySettings {
    pub max_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_HISTORY_ENTRIES,
        }
    }
}

impl Config {
    /// Built-in defaults with every key attributed to [`ConfigSource::Default`].
    #[must_use]
    pub fn defaults() -> Self {
        let source_attribution = TRACKED_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        Self {
            llm: LlmSettings::default(),
            retry: RetrySettings::default(),
            paths: PathSettings::default(),
            history: HistorySettings::default(),
            api_key: None,
            config_path: None,
            source_attribution,
        }
    }

    pub fn output_dir(&self) -> &Utf8Path {
        &self.paths.output_dir
    }

    pub fn feedback_dir(&self) -> &Utf8Path {
        &self.paths.feedback_dir
    }

    /// Where a key's effective value came from.
    #[must_use]
    pub fn source_of(&self, key: &str) -> ConfigSource {
        self.source_attribution
            .get(key)
            .cloned()
            .unwrap_or(ConfigSource::Default)
    }

    /// Effective configuration as `(key, value, source)` rows for display.
    ///
    /// The API key is masked; only its presence and last four characters show.
    #[must_use]
    pub fn effective_config(&self) -> Vec<(String, String, String)> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if key != PLACEHOLDER_API_KEY && !key.is_empty() => {
                sermon_utils::redaction::mask_api_key(key)
            }
            Some(_) => "(placeholder)".to_string(),
            None => "(unset)".to_string(),
        };

        let rows = [
            ("llm.model", self.llm.model.clone()),
            ("llm.api_key_env", self.llm.api_key_env.clone()),
            ("llm.api_key", api_key),
            ("llm.max_output_tokens", self.llm.max_output_tokens.to_string()),
            ("llm.temperature", self.llm.temperature.to_string()),
            ("llm.base_url", self.llm.base_url.clone()),
            (
                "llm.request_timeout_secs",
                self.llm.request_timeout_secs.to_string(),
            ),
            ("retry.max_retries", self.retry.max_retries.to_string()),
            (
                "retry.initial_delay_secs",
                self.retry.initial_delay_secs.to_string(),
            ),
            ("retry.backoff_factor", self.retry.backoff_factor.to_string()),
            ("paths.output_dir", self.paths.output_dir.to_string()),
            ("paths.feedback_dir", self.paths.feedback_dir.to_string()),
            ("history.max_entries", self.history.max_entries.to_string()),
        ];

        rows.into_iter()
            .map(|(key, value)| {
                let source_key = if key == "llm.api_key" {
                    "llm.api_key_env"
                } else {
                    key
                };
                let source = if key == "llm.api_key" && self.api_key.is_some() {
                    ConfigSource::Env
                } else {
                    self.source_of(source_key)
                };
                (key.to_string(), value, source.as_str().to_string())
            })
            .collect()
    }
}

/// Keys tracked in `source_attribution`.
pub(crate) const TRACKED_KEYS: [&str; 12] = [
    "llm.model",
    "llm.api_key_env",
    "llm.max_output_tokens",
    "llm.temperature",
    "llm.base_url",
    "llm.request_timeout_secs",
    "retry.max_retries",
    "retry.initial_delay_secs",
    "retry.backoff_factor",
    "paths.output_dir",
    "paths.feedback_dir",
    "history.max_entries",
];

/// TOML configuration file structure. Every key is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub llm: Option<TomlLlm>,
    pub retry: Option<TomlRetry>,
    pub paths: Option<TomlPaths>,
    pub history: Option<TomlHistory>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlLlm {
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlRetry {
    pub max_retries: Option<u32>,
    pub initial_delay_secs: Option<f64>,
    pub backoff_factor: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlPaths {
    pub output_dir: Option<Utf8PathBuf>,
    pub feedback_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlHistory {
    pub max_entries: Option<usize>,
}
