//! Post-sermon feedback: collection, storage and the manuscript hint.
//!
//! Each feedback session becomes one file in the feedback directory. Files
//! are never overwritten; the manuscript stage reads all of them back as a
//! single hint.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use tracing::{debug, info};

use sermon_utils::atomic_write::write_new_file_atomic;
use sermon_utils::error::SermonError;

use crate::request::DATE_FORMAT;
use crate::scan::{Hint, ScanReport, read_text};

/// Questions asked after a sermon has been preached, in order.
pub const FEEDBACK_QUESTIONS: [&str; 7] = [
    "Which part of the sermon resonated most with the congregation?",
    "Which illustration or example felt weak or unclear?",
    "Was the length appropriate for the service?",
    "Did the tone suit the audience?",
    "Which application point was hardest to put into practice?",
    "What should be emphasized more next time?",
    "Any other comments?",
];

/// Recorded in place of a blank answer.
pub const NO_OPINION: &str = "(no opinion)";

/// Answers to [`FEEDBACK_QUESTIONS`] for one preached sermon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEntry {
    pub sermon_date: NaiveDate,
    answers: [String; 7],
}

impl FeedbackEntry {
    /// Blank answers are replaced by [`NO_OPINION`].
    #[must_use]
    pub fn new(sermon_date: NaiveDate, answers: [String; 7]) -> Self {
        let answers = answers.map(|answer| {
            let trimmed = answer.trim();
            if trimmed.is_empty() {
                NO_OPINION.to_string()
            } else {
                trimmed.to_string()
            }
        });
        Self {
            sermon_date,
            answers,
        }
    }

    #[must_use]
    pub fn answers(&self) -> &[String; 7] {
        &self.answers
    }

    /// Markdown body of the stored record.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "# Sermon feedback: {}\n",
            self.sermon_date.format(DATE_FORMAT)
        );
        for (n, (question, answer)) in FEEDBACK_QUESTIONS.iter().zip(&self.answers).enumerate() {
            out.push_str(&format!("\n## {}. {question}\n\n{answer}\n", n + 1));
        }
        out
    }
}

/// `{YYYY-MM-DD}_feedback_{run_timestamp}.md`
#[must_use]
pub fn feedback_file_name(sermon_date: NaiveDate, run_timestamp: &str) -> String {
    format!(
        "{}_feedback_{run_timestamp}.md",
        sermon_date.format(DATE_FORMAT)
    )
}

/// The feedback directory.
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    dir: Utf8PathBuf,
}

impl FeedbackStore {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Store one session.
    ///
    /// # Errors
    ///
    /// Returns `SermonError::Persistence` if the file cannot be written or a
    /// file with the same name already exists.
    pub fn record(
        &self,
        entry: &FeedbackEntry,
        run_timestamp: &str,
    ) -> Result<Utf8PathBuf, SermonError> {
        let path = self
            .dir
            .join(feedback_file_name(entry.sermon_date, run_timestamp));
        write_new_file_atomic(&path, &entry.render()).map_err(|e| SermonError::Persistence {
            path: path.to_string(),
            reason: format!("{e:#}"),
        })?;
        info!(path = %path, "Feedback recorded");
        Ok(path)
    }

    /// Concatenate every non-empty feedback file, each labelled by its name.
    ///
    /// Files are read in name order. A missing directory yields an empty hint.
    #[must_use]
    pub fn load(&self) -> Hint {
        let mut report = ScanReport::default();
        let Ok(entries) = self.dir.read_dir_utf8() else {
            debug!(dir = %self.dir, "No feedback directory");
            return Hint::default();
        };

        let mut files: Vec<Utf8PathBuf> = entries
            .flatten()
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.path().to_path_buf())
            .filter(|p| !p.file_name().is_some_and(|n| n.starts_with('.')))
            .collect();
        files.sort();

        let mut sections = Vec::new();
        for path in files {
            match read_text(&path) {
                Ok(text) => {
                    report.loaded(&path);
                    let name = path.file_name().unwrap_or(path.as_str());
                    sections.push(format!("[{name}]\n{}", text.trim()));
                }
                Err(reason) => report.skipped(&path, reason),
            }
        }

        Hint {
            text: sections.join("\n\n"),
            report,
        }
    }
}
