//! Progress reporting seam.
//!
//! The pipeline and the retrying client never print directly; they notify a
//! [`ProgressReporter`] handed to them at construction.

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use camino::Utf8Path;
use tracing::{info, warn};

use crate::types::StageId;

/// Receives progress notifications from a run.
pub trait ProgressReporter: Send + Sync {
    fn stage_started(&self, stage: StageId);

    fn stage_saved(&self, stage: StageId, path: &Utf8Path);

    /// Called before the client sleeps ahead of another attempt.
    fn retry_scheduled(&self, attempt: u32, max_attempts: u32, delay: Duration, reason: &str);

    fn run_finished(&self, run_dir: &Utf8Path);
}

/// Forwards progress to `tracing`. The default for library use.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn stage_started(&self, stage: StageId) {
        info!(stage = %stage, name = stage.display_name(), "Stage started");
    }

    fn stage_saved(&self, stage: StageId, path: &Utf8Path) {
        info!(stage = %stage, path = %path, "Stage output saved");
    }

    fn retry_scheduled(&self, attempt: u32, max_attempts: u32, delay: Duration, reason: &str) {
        warn!(
            attempt,
            max_attempts,
            delay_secs = delay.as_secs_f64(),
            reason,
            "Generation failed, retrying"
        );
    }

    fn run_finished(&self, run_dir: &Utf8Path) {
        info!(path = %run_dir, "Run finished");
    }
}

/// Human-oriented progress lines on stderr, used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn stage_started(&self, stage: StageId) {
        eprintln!("[{}/5] {}...", stage.index(), stage.display_name());
    }

    fn stage_saved(&self, stage: StageId, path: &Utf8Path) {
        eprintln!("  ✓ {} saved to {path}", stage.key());
    }

    fn retry_scheduled(&self, attempt: u32, max_attempts: u32, delay: Duration, reason: &str) {
        eprintln!(
            "  ! attempt {attempt}/{max_attempts} failed ({reason}); retrying in {:.0}s",
            delay.as_secs_f64()
        );
        let _ = std::io::stderr().flush();
    }

    fn run_finished(&self, run_dir: &Utf8Path) {
        eprintln!("All stages complete: {run_dir}");
    }
}

/// Discards all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn stage_started(&self, _stage: StageId) {}
    fn stage_saved(&self, _stage: StageId, _path: &Utf8Path) {}
    fn retry_scheduled(&self, _attempt: u32, _max_attempts: u32, _delay: Duration, _reason: &str) {}
    fn run_finished(&self, _run_dir: &Utf8Path) {}
}

/// A notification captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    StageStarted(StageId),
    StageSaved(StageId, String),
    RetryScheduled {
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        reason: String,
    },
    RunFinished(String),
}

/// Keeps every notification in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Delays announced through `retry_scheduled`, in order.
    #[must_use]
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ProgressEvent::RetryScheduled { delay, .. } => Some(delay),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ProgressReporter for RecordingReporter {
    fn stage_started(&self, stage: StageId) {
        self.push(ProgressEvent::StageStarted(stage));
    }

    fn stage_saved(&self, stage: StageId, path: &Utf8Path) {
        self.push(ProgressEvent::StageSaved(stage, path.to_string()));
    }

    fn retry_scheduled(&self, attempt: u32, max_attempts: u32, delay: Duration, reason: &str) {
        self.push(ProgressEvent::RetryScheduled {
            attempt,
            max_attempts,
            delay,
            reason: reason.to_string(),
        });
    }

    fn run_finished(&self, run_dir: &Utf8Path) {
        self.push(ProgressEvent::RunFinished(run_dir.to_string()));
    }
}
