use sermon_utils::error::ConfigError;

use super::Config;
use super::model::PLACEHOLDER_API_KEY;

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "must not be empty"));
        }

        if self.llm.max_output_tokens == 0 {
            return Err(invalid("llm.max_output_tokens", "must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                &format!("{} is outside 0.0..=2.0", self.llm.temperature),
            ));
        }

        if !self.llm.base_url.starts_with("http://") && !self.llm.base_url.starts_with("https://")
        {
            return Err(invalid("llm.base_url", "must be an http(s) URL"));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(invalid("llm.request_timeout_secs", "must be greater than 0"));
        }

        if !self.retry.initial_delay_secs.is_finite() || self.retry.initial_delay_secs < 0.0 {
            return Err(invalid("retry.initial_delay_secs", "must be a non-negative number"));
        }

        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            return Err(invalid("retry.backoff_factor", "must be at least 1.0"));
        }

        if self.retry.max_retries > 10 {
            return Err(invalid("retry.max_retries", "exceeds maximum limit of 10"));
        }

        if self.paths.output_dir.as_str().is_empty() {
            return Err(invalid("paths.output_dir", "must not be empty"));
        }

        if self.paths.feedback_dir.as_str().is_empty() {
            return Err(invalid("paths.feedback_dir", "must not be empty"));
        }

        Ok(())
    }

    /// The Gemini API key, or the configuration error that blocks any run.
    ///
    /// A missing, blank or placeholder key is an error.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        let env_var = self.llm.api_key_env.clone();
        match self.api_key.as_deref().map(str::trim) {
            None | Some("") => Err(ConfigError::MissingApiKey { env_var }),
            Some(PLACEHOLDER_API_KEY) => Err(ConfigError::PlaceholderApiKey { env_var }),
            Some(key) => Ok(key),
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
