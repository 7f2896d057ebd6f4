use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use sermon_utils::error::ConfigError;

use super::model::{FEEDBACK_DIR_ENV, MODEL_ENV, OUTPUT_DIR_ENV, TomlConfig};
use super::{CliArgs, Config, ConfigSource};

/// Directory searched for in the working directory and its ancestors.
pub const CONFIG_DIR_NAME: &str = ".sermon-auto";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Project-local environment file, found the same way as the config file.
pub const DOTENV_FILE_NAME: &str = ".env";

impl Config {
    /// Discover and load configuration with precedence: CLI > env > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir()
            .map_err(|e| ConfigError::DiscoveryFailed(format!("current directory: {e}")))?;
        let start_dir = Utf8PathBuf::from_path_buf(start_dir).map_err(|p| {
            ConfigError::DiscoveryFailed(format!("non UTF-8 working directory: {}", p.display()))
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover configuration starting from a specific directory, reading the
    /// process environment.
    ///
    /// Variables from a project `.env` file fill in whatever the process
    /// environment leaves unset; real environment variables always win.
    pub fn discover_from(start_dir: &Utf8Path, cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let dotenv = match Self::discover_dotenv_from(start_dir) {
            Some(path) => load_dotenv(&path)?,
            None => BTreeMap::new(),
        };
        Self::discover_with_env(start_dir, cli_args, |name| {
            std::env::var(name)
                .ok()
                .or_else(|| dotenv.get(name).cloned())
        })
    }

    /// Path-and-environment driven variant used by tests to avoid process-global state.
    pub fn discover_with_env(
        start_dir: &Utf8Path,
        cli_args: &CliArgs,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::defaults();

        let config_path = match &cli_args.config_path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(ConfigError::NotFound {
                        path: explicit.to_string(),
                    });
                }
                Some(explicit.clone())
            }
            None => Self::discover_config_file_from(start_dir),
        };

        if let Some(path) = &config_path {
            debug!(path = %path, "Loading configuration file");
            let file_config = Self::load_config_file(path)?;
            config.apply_file(file_config);
            config.config_path = Some(path.clone());
        }

        if let Some(model) = env(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.set("llm.model", ConfigSource::Env);
            config.llm.model = model;
        }
        if let Some(dir) = env(OUTPUT_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.set("paths.output_dir", ConfigSource::Env);
            config.paths.output_dir = Utf8PathBuf::from(dir);
        }
        if let Some(dir) = env(FEEDBACK_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.set("paths.feedback_dir", ConfigSource::Env);
            config.paths.feedback_dir = Utf8PathBuf::from(dir);
        }

        if let Some(model) = &cli_args.model {
            config.set("llm.model", ConfigSource::Cli);
            config.llm.model = model.clone();
        }
        if let Some(dir) = &cli_args.output_dir {
            config.set("paths.output_dir", ConfigSource::Cli);
            config.paths.output_dir = dir.clone();
        }

        config.api_key = env(&config.llm.api_key_env);

        config.validate()?;
        Ok(config)
    }

    /// Search `start_dir` and its ancestors for `.sermon-auto/config.toml`.
    ///
    /// The search stops at the first repository root (`.git`, `.hg`, `.svn`).
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }

            if is_repository_root(dir) {
                break;
            }

            current = dir.parent();
        }

        None
    }

    /// Search `start_dir` and its ancestors for a `.env` file, stopping at the
    /// first repository root.
    #[must_use]
    pub fn discover_dotenv_from(start_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start_dir);

        while let Some(dir) = current {
            let candidate = dir.join(DOTENV_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if is_repository_root(dir) {
                break;
            }
            current = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Utf8Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidFile(format!("{path}: {e}")))?;
        toml::from_str(&content).map_err(|e| ConfigError::InvalidFile(format!("{path}: {e}")))
    }

    fn apply_file(&mut self, file: TomlConfig) {
        let source = ConfigSource::Config;

        if let Some(llm) = file.llm {
            if let Some(model) = llm.model {
                self.llm.model = model;
                self.set("llm.model", source.clone());
            }
            if let Some(env) = llm.api_key_env {
                self.llm.api_key_env = env;
                self.set("llm.api_key_env", source.clone());
            }
            if let Some(tokens) = llm.max_output_tokens {
                self.llm.max_output_tokens = tokens;
                self.set("llm.max_output_tokens", source.clone());
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
                self.set("llm.temperature", source.clone());
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
                self.set("llm.base_url", source.clone());
            }
            if let Some(timeout) = llm.request_timeout_secs {
                self.llm.request_timeout_secs = timeout;
                self.set("llm.request_timeout_secs", source.clone());
            }
        }

        if let Some(retry) = file.retry {
            if let Some(max_retries) = retry.max_retries {
                self.retry.max_retries = max_retries;
                self.set("retry.max_retries", source.clone());
            }
            if let Some(delay) = retry.initial_delay_secs {
                self.retry.initial_delay_secs = delay;
                self.set("retry.initial_delay_secs", source.clone());
            }
            if let Some(factor) = retry.backoff_factor {
                self.retry.backoff_factor = factor;
                self.set("retry.backoff_factor", source.clone());
            }
        }

        if let Some(paths) = file.paths {
            if let Some(dir) = paths.output_dir {
                self.paths.output_dir = dir;
                self.set("paths.output_dir", source.clone());
            }
            if let Some(dir) = paths.feedback_dir {
                self.paths.feedback_dir = dir;
                self.set("paths.feedback_dir", source.clone());
            }
        }

        if let Some(history) = file.history
            && let Some(max_entries) = history.max_entries
        {
            self.history.max_entries = max_entries;
            self.set("history.max_entries", source);
        }
    }

    fn set(&mut self, key: &str, source: ConfigSource) {
        self.source_attribution.insert(key.to_string(), source);
    }
}

fn is_repository_root(dir: &Utf8Path) -> bool {
    dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
}

/// Parse a `.env` file into a map without touching the process environment.
///
/// # Errors
///
/// Returns `ConfigError::InvalidFile` when the file cannot be read or a line
/// cannot be parsed.
pub fn load_dotenv(path: &Utf8Path) -> Result<BTreeMap<String, String>, ConfigError> {
    debug!(path = %path, "Loading environment file");
    let invalid = |e: dotenvy::Error| ConfigError::InvalidFile(format!("{path}: {e}"));
    dotenvy::from_path_iter(path.as_std_path())
        .map_err(invalid)?
        .map(|item| item.map_err(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn write_config(root: &Utf8Path, body: &str) -> Utf8PathBuf {
        let dir = root.join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();

        let config =
            Config::discover_with_env(&utf8(&dir), &CliArgs::default(), env_from(&[])).unwrap();

        assert!(config.config_path.is_none());
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.source_of("llm.model"), ConfigSource::Default);
    }

    #[test]
    fn test_file_values_are_applied_with_attribution() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        write_config(
            &root,
            r#"
[llm]
model = "gemini-1.5-pro"
temperature = 0.4

[retry]
max_retries = 5

[paths]
output_dir = "sermons"

[history]
max_entries = 3
"#,
        );

        let config =
            Config::discover_with_env(&root, &CliArgs::default(), env_from(&[])).unwrap();

        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert!((config.llm.temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.paths.output_dir, Utf8PathBuf::from("sermons"));
        assert_eq!(config.history.max_entries, 3);
        assert_eq!(config.source_of("retry.max_retries"), ConfigSource::Config);
        assert_eq!(config.source_of("retry.backoff_factor"), ConfigSource::Default);
    }

    #[test]
    fn test_discovery_walks_upward() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        let expected = write_config(&root, "[llm]\nmodel = \"upward\"\n");
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(Config::discover_config_file_from(&nested), Some(expected));
    }

    #[test]
    fn test_discovery_stops_at_repository_root() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        write_config(&root, "[llm]\nmodel = \"outside\"\n");
        let repo = root.join("repo");
        std::fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(Config::discover_config_file_from(&repo), None);
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        write_config(&root, "[llm]\nmodel = \"from-file\"\n");

        let env = env_from(&[("GEMINI_MODEL", "from-env")]);
        let config = Config::discover_with_env(&root, &CliArgs::default(), &env).unwrap();
        assert_eq!(config.llm.model, "from-env");
        assert_eq!(config.source_of("llm.model"), ConfigSource::Env);

        let cli = CliArgs {
            model: Some("from-cli".to_string()),
            ..CliArgs::default()
        };
        let config = Config::discover_with_env(&root, &cli, &env).unwrap();
        assert_eq!(config.llm.model, "from-cli");
        assert_eq!(config.source_of("llm.model"), ConfigSource::Cli);
    }

    #[test]
    fn test_api_key_read_from_named_variable() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        write_config(&root, "[llm]\napi_key_env = \"MY_KEY\"\n");

        let env = env_from(&[("MY_KEY", "secret-value-123"), ("GEMINI_API_KEY", "other")]);
        let config = Config::discover_with_env(&root, &CliArgs::default(), env).unwrap();
        assert_eq!(config.api_key().unwrap(), "secret-value-123");
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(utf8(&dir).join("nope.toml")),
            ..CliArgs::default()
        };
        let err = Config::discover_with_env(&utf8(&dir), &cli, env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_file_is_invalid_file() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        write_config(&root, "[llm\nmodel = ");
        let err = Config::discover_with_env(&root, &CliArgs::default(), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile(_)));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        write_config(&root, "[llm]\nmodle = \"typo\"\n");
        let err = Config::discover_with_env(&root, &CliArgs::default(), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile(_)));
    }

    #[test]
    fn test_dotenv_is_found_in_ancestor_up_to_repository_root() {
        let dir = TempDir::new().unwrap();
        let root = utf8(&dir);
        std::fs::create_dir(root.join(".git")).unwrap();
        std::fs::write(root.join(".env"), "GEMINI_API_KEY=from-dotenv\n").unwrap();
        let nested = root.join("sermons").join("2026");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            Config::discover_dotenv_from(&nested),
            Some(root.join(".env"))
        );
    }

    #[test]
    fn test_load_dotenv_parses_quotes_and_comments() {
        let dir = TempDir::new().unwrap();
        let path = utf8(&dir).join(".env");
        std::fs::write(
            &path,
            "# local secrets\nGEMINI_API_KEY=\"quoted-key\"\nGEMINI_MODEL=gemini-local\n",
        )
        .unwrap();

        let vars = load_dotenv(&path).unwrap();

        assert_eq!(vars.get("GEMINI_API_KEY").map(String::as_str), Some("quoted-key"));
        assert_eq!(vars.get("GEMINI_MODEL").map(String::as_str), Some("gemini-local"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_malformed_dotenv_is_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = utf8(&dir).join(".env");
        std::fs::write(&path, "GEMINI_API_KEY='unterminated\n").unwrap();

        assert!(matches!(load_dotenv(&path), Err(ConfigError::InvalidFile(_))));
    }
}
