//! Tracing setup and structured stage logging.
//!
//! `RUST_LOG` always wins; otherwise `--verbose` raises the workspace crates to
//! `debug` and emits span-close events with timings.

use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::redaction::redact_secrets;
use crate::types::StageId;

const WORKSPACE_TARGETS: [&str; 6] = [
    "sermon_auto",
    "sermon_config",
    "sermon_engine",
    "sermon_llm",
    "sermon_phases",
    "sermon_utils",
];

/// Default filter directive for the given verbosity.
#[must_use]
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives: Vec<String> = WORKSPACE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Span wrapping one stage of a run.
pub fn stage_span(run_id: &str, stage: StageId) -> tracing::Span {
    span!(
        Level::INFO,
        "stage",
        run_id = %run_id,
        stage = %stage,
    )
}

pub fn log_stage_start(run_id: &str, stage: StageId) {
    info!(
        run_id = %run_id,
        stage = %stage,
        name = stage.display_name(),
        "Starting stage"
    );
}

pub fn log_stage_complete(run_id: &str, stage: StageId, duration_ms: u128, path: &str) {
    info!(
        run_id = %run_id,
        stage = %stage,
        duration_ms = %duration_ms,
        path = %path,
        "Stage completed"
    );
}

/// Error text is redacted before it reaches the subscriber.
pub fn log_stage_error(run_id: &str, stage: StageId, error: &str, duration_ms: u128) {
    error!(
        run_id = %run_id,
        stage = %stage,
        duration_ms = %duration_ms,
        error = %redact_secrets(error),
        "Stage failed"
    );
}
