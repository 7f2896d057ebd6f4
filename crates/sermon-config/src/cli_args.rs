use camino::Utf8PathBuf;

/// Configuration overrides taken from global CLI flags.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit `--config` path; disables upward discovery.
    pub config_path: Option<Utf8PathBuf>,
    pub model: Option<String>,
    pub output_dir: Option<Utf8PathBuf>,
}
