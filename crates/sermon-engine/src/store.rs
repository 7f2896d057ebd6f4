//! On-disk layout for stage artifacts.
//!
//! ```text
//! <output_dir>/
//!   2026-03-01/
//!     20260225_091502_417_phase1_selection.md
//!     20260225_091502_417_phase2_outline.md
//!     ...
//! ```
//!
//! One directory per delivery date, shared by every run that targets that
//! date. File names carry the run timestamp, so runs never overwrite each
//! other.

use std::fs;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local, NaiveDate};
use tracing::debug;

use sermon_utils::atomic_write::write_file_atomic;
use sermon_utils::error::SermonError;
use sermon_utils::types::StageId;

use crate::request::DATE_FORMAT;

/// Format of the per-run timestamp embedded in artifact names.
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// Render the run timestamp for `now`.
#[must_use]
pub fn run_timestamp(now: DateTime<Local>) -> String {
    now.format(RUN_TIMESTAMP_FORMAT).to_string()
}

/// `{run_timestamp}_phase{N}_{label}.md`
#[must_use]
pub fn artifact_file_name(run_timestamp: &str, stage: StageId) -> String {
    format!(
        "{run_timestamp}_phase{}_{}.md",
        stage.index(),
        stage.label()
    )
}

/// Suffix shared by every artifact of `stage`, regardless of run.
fn artifact_suffix(stage: StageId) -> String {
    format!("_phase{}_{}.md", stage.index(), stage.label())
}

/// Stores stage output under the configured output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: Utf8PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory holding every run for `date`.
    #[must_use]
    pub fn date_dir(&self, date: NaiveDate) -> Utf8PathBuf {
        self.root.join(date.format(DATE_FORMAT).to_string())
    }

    /// Create the directory for `date` if needed.
    ///
    /// # Errors
    ///
    /// Returns `SermonError::Persistence` if the directory cannot be created.
    pub fn prepare_date_dir(&self, date: NaiveDate) -> Result<Utf8PathBuf, SermonError> {
        let dir = self.date_dir(date);
        fs::create_dir_all(&dir).map_err(|e| SermonError::Persistence {
            path: dir.to_string(),
            reason: e.to_string(),
        })?;
        Ok(dir)
    }

    /// Atomically write the raw text of `stage` into `run_dir`.
    ///
    /// # Errors
    ///
    /// Returns `SermonError::Persistence` if the write fails.
    pub fn persist(
        &self,
        run_dir: &Utf8Path,
        run_timestamp: &str,
        stage: StageId,
        content: &str,
    ) -> Result<Utf8PathBuf, SermonError> {
        let path = run_dir.join(artifact_file_name(run_timestamp, stage));
        write_file_atomic(&path, content).map_err(|e| SermonError::Persistence {
            path: path.to_string(),
            reason: format!("{e:#}"),
        })?;
        debug!(stage = %stage, path = %path, bytes = content.len(), "Persisted stage artifact");
        Ok(path)
    }

    /// Read an artifact back exactly as written.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not UTF-8.
    pub fn load(&self, path: &Utf8Path) -> anyhow::Result<String> {
        fs::read_to_string(path).with_context(|| format!("Failed to read artifact: {path}"))
    }

    /// Every artifact of `stage` across all date directories, unsorted.
    ///
    /// A missing root yields an empty list. Unreadable directories are skipped.
    #[must_use]
    pub fn stage_artifacts(&self, stage: StageId) -> Vec<Utf8PathBuf> {
        let suffix = artifact_suffix(stage);
        let Ok(entries) = self.root.read_dir_utf8() else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for entry in entries.flatten() {
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let Ok(files) = entry.path().read_dir_utf8() else {
                debug!(path = %entry.path(), "Skipping unreadable run directory");
                continue;
            };
            found.extend(
                files
                    .flatten()
                    .filter(|f| f.file_name().ends_with(&suffix))
                    .map(|f| f.path().to_path_buf()),
            );
        }
        found
    }
}
