//! Summaries of previously selected passages.
//!
//! The selection stage is asked to steer away from recent texts and themes.
//! This module reads earlier selection artifacts and condenses them into a
//! short numbered list for that purpose.

use std::fs;
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use sermon_utils::types::StageId;

use crate::scan::{Hint, ScanReport, read_text};
use crate::store::ArtifactStore;

/// Marker labels recognised in selection output, English and Korean.
#[allow(clippy::expect_used)]
static MARKER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(selected\s+passage|recommended\s+theme|selection\s+rationale|선정\s*본문|선택\s*본문|추천\s*주제|선정\s*(이유|근거))",
    )
    .expect("valid regex")
});

/// Longest line kept per summary entry.
const MAX_LINE_CHARS: usize = 200;

/// Reads prior selection artifacts from an [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct HistoryLoader {
    store: ArtifactStore,
    max_count: usize,
}

impl HistoryLoader {
    #[must_use]
    pub fn new(store: ArtifactStore, max_count: usize) -> Self {
        Self { store, max_count }
    }

    /// Summarise the `max_count` most recent usable selection artifacts.
    ///
    /// Returns an empty hint when none exist. Unusable files are skipped and
    /// listed in the report.
    #[must_use]
    pub fn load(&self) -> Hint {
        let mut report = ScanReport::default();
        if self.max_count == 0 {
            return Hint::default();
        }

        let mut entries = Vec::new();
        for path in newest_first(self.store.stage_artifacts(StageId::Selection)) {
            if entries.len() == self.max_count {
                break;
            }
            match read_text(&path) {
                Ok(text) => {
                    report.loaded(&path);
                    entries.push((run_label(&path), summary_lines(&text)));
                }
                Err(reason) => report.skipped(&path, reason),
            }
        }

        debug!(
            loaded = report.loaded_count(),
            skipped = report.skip_reasons().len(),
            "History scan finished"
        );

        Hint {
            text: render(&entries),
            report,
        }
    }
}

fn newest_first(paths: Vec<Utf8PathBuf>) -> Vec<Utf8PathBuf> {
    let mut stamped: Vec<(SystemTime, Utf8PathBuf)> = paths
        .into_iter()
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();
    stamped.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
    stamped.into_iter().map(|(_, path)| path).collect()
}

/// The date directory a run artifact lives in, followed by the time of the
/// run that wrote it so several runs for one date stay distinguishable.
fn run_label(path: &Utf8Path) -> String {
    let date = path
        .parent()
        .and_then(Utf8Path::file_name)
        .unwrap_or("unknown date");

    let Some(stamp) = path.file_stem().and_then(|stem| stem.split("_phase").next()) else {
        return date.to_string();
    };
    let run = stamp
        .get(..15)
        .and_then(|prefix| NaiveDateTime::parse_from_str(prefix, "%Y%m%d_%H%M%S").ok())
        .map_or_else(
            || stamp.to_string(),
            |time| time.format("%Y-%m-%d %H:%M:%S").to_string(),
        );
    format!("{date} (run {run})")
}

/// Marker lines of a selection output, or its first line when it has none.
fn summary_lines(text: &str) -> Vec<String> {
    let lines: Vec<String> = text
        .lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .collect();

    let marked: Vec<String> = lines
        .iter()
        .filter(|line| MARKER_LINE.is_match(line))
        .map(|line| clip(line))
        .collect();

    if marked.is_empty() {
        lines.first().map(|line| vec![clip(line)]).unwrap_or_default()
    } else {
        marked
    }
}

/// Strip Markdown decoration from a line.
fn clean_line(line: &str) -> String {
    line.trim()
        .trim_start_matches(['#', '>', '-', '*'])
        .replace("**", "")
        .trim()
        .to_string()
}

fn clip(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_CHARS {
        line.to_string()
    } else {
        let mut clipped: String = line.chars().take(MAX_LINE_CHARS).collect();
        clipped.push('…');
        clipped
    }
}

fn render(entries: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    for (n, (label, lines)) in entries.iter().enumerate() {
        out.push_str(&format!("{}. {label}\n", n + 1));
        for line in lines {
            out.push_str(&format!("   {line}\n"));
        }
    }
    out.trim_end().to_string()
}
