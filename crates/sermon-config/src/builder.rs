use camino::Utf8PathBuf;

use sermon_utils::error::ConfigError;

use super::{Config, ConfigSource};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sermon_config::Config;
    ///
    /// let config = Config::builder()
    ///     .api_key("test-key")
    ///     .output_dir("/tmp/sermons")
    ///     .max_retries(1)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.retry.max_retries, 1);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for [`Config`] that never touches the environment or the filesystem.
///
/// Values set through the builder are attributed to
/// [`ConfigSource::Programmatic`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    model: Option<String>,
    api_key: Option<String>,
    max_output_tokens: Option<u32>,
    temperature: Option<f32>,
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    initial_delay_secs: Option<f64>,
    backoff_factor: Option<f64>,
    output_dir: Option<Utf8PathBuf>,
    feedback_dir: Option<Utf8PathBuf>,
    history_entries: Option<usize>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the API key directly instead of reading `api_key_env`.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Point the client at a different endpoint, e.g. a local test server.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    #[must_use]
    pub fn initial_delay_secs(mut self, secs: f64) -> Self {
        self.initial_delay_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = Some(factor);
        self
    }

    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn feedback_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.feedback_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn history_entries(mut self, entries: usize) -> Self {
        self.history_entries = Some(entries);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a value fails validation.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config::defaults();
        let source = ConfigSource::Programmatic;

        macro_rules! apply {
            ($field:expr, $target:expr, $key:literal) => {
                if let Some(value) = $field {
                    $target = value;
                    config
                        .source_attribution
                        .insert($key.to_string(), source.clone());
                }
            };
        }

        apply!(self.model, config.llm.model, "llm.model");
        apply!(
            self.max_output_tokens,
            config.llm.max_output_tokens,
            "llm.max_output_tokens"
        );
        apply!(self.temperature, config.llm.temperature, "llm.temperature");
        apply!(self.base_url, config.llm.base_url, "llm.base_url");
        apply!(
            self.request_timeout_secs,
            config.llm.request_timeout_secs,
            "llm.request_timeout_secs"
        );
        apply!(self.max_retries, config.retry.max_retries, "retry.max_retries");
        apply!(
            self.initial_delay_secs,
            config.retry.initial_delay_secs,
            "retry.initial_delay_secs"
        );
        apply!(
            self.backoff_factor,
            config.retry.backoff_factor,
            "retry.backoff_factor"
        );
        apply!(self.output_dir, config.paths.output_dir, "paths.output_dir");
        apply!(
            self.feedback_dir,
            config.paths.feedback_dir,
            "paths.feedback_dir"
        );
        apply!(
            self.history_entries,
            config.history.max_entries,
            "history.max_entries"
        );

        config.api_key = self.api_key;
        config.validate()?;
        Ok(config)
    }
}
