//! Per-file outcomes for the tolerant history and feedback loaders.
//!
//! A file that cannot be used is recorded with a [`SkipReason`] and logged at
//! `warn`; it never fails the run.

use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be opened or read.
    Unreadable(String),
    /// The bytes are not valid UTF-8.
    InvalidUtf8,
    /// Nothing but whitespace.
    Empty,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(e) => write!(f, "unreadable: {e}"),
            Self::InvalidUtf8 => f.write_str("not valid UTF-8"),
            Self::Empty => f.write_str("empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Loaded,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub path: Utf8PathBuf,
    pub outcome: ScanOutcome,
}

/// What a loader did with each file it looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    entries: Vec<ScanEntry>,
}

impl ScanReport {
    pub(crate) fn loaded(&mut self, path: &Utf8Path) {
        self.entries.push(ScanEntry {
            path: path.to_path_buf(),
            outcome: ScanOutcome::Loaded,
        });
    }

    pub(crate) fn skipped(&mut self, path: &Utf8Path, reason: SkipReason) {
        warn!(path = %path, reason = %reason, "Skipping file");
        self.entries.push(ScanEntry {
            path: path.to_path_buf(),
            outcome: ScanOutcome::Skipped(reason),
        });
    }

    #[must_use]
    pub fn entries(&self) -> &[ScanEntry] {
        &self.entries
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == ScanOutcome::Loaded)
            .count()
    }

    /// Skipped files with their reasons, in scan order.
    #[must_use]
    pub fn skip_reasons(&self) -> Vec<(&Utf8Path, &SkipReason)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                ScanOutcome::Skipped(reason) => Some((e.path.as_path(), reason)),
                ScanOutcome::Loaded => None,
            })
            .collect()
    }
}

/// Loader output: the rendered hint and how each file was handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hint {
    pub text: String,
    pub report: ScanReport,
}

/// Read a file as non-empty UTF-8 text.
pub(crate) fn read_text(path: &Utf8Path) -> Result<String, SkipReason> {
    let bytes = fs::read(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|_| SkipReason::InvalidUtf8)?;
    if text.trim().is_empty() {
        return Err(SkipReason::Empty);
    }
    Ok(text)
}
