//! Document export.
//!
//! The final manuscript becomes the body of the document; the selection and
//! review outputs follow as appendices. Any of the three may be absent.
//! [`DocxExporter`](crate::docx::DocxExporter) produces the formatted
//! document; [`MarkdownExporter`] writes the same sections as plain text.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use tracing::info;

use sermon_utils::atomic_write::write_file_atomic;
use sermon_utils::error::SermonError;

use crate::request::DATE_FORMAT;
use crate::results::ResultSet;

/// Turns a result set into a document on disk.
pub trait Exporter {
    /// # Errors
    ///
    /// Returns `SermonError::Export` if the document cannot be written.
    fn export(
        &self,
        results: &ResultSet,
        bible_range: &str,
        sermon_date: NaiveDate,
    ) -> Result<Utf8PathBuf, SermonError>;
}

/// Writes a single Markdown document into the output directory.
#[derive(Debug, Clone)]
pub struct MarkdownExporter {
    output_dir: Utf8PathBuf,
}

impl MarkdownExporter {
    pub fn new(output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }
}

/// Title shown at the top of every exported document.
pub const DOCUMENT_TITLE: &str = "Sermon Manuscript";

/// Sections in document order: the final sermon, then the appendices.
pub const DOCUMENT_SECTIONS: [(&str, &str); 3] = [
    ("phase5", "Final Sermon"),
    ("phase1", "Appendix A: Text Selection"),
    ("phase3", "Appendix B: Review Report"),
];

/// `{date}_sermon_{range}`, with the range made safe for a file name:
/// whitespace runs become `_`, `:` becomes `.`, slashes become `-`.
#[must_use]
pub fn document_stem(bible_range: &str, sermon_date: NaiveDate) -> String {
    let range: String = bible_range
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter_map(|c| match c {
            ':' => Some('.'),
            '/' | '\\' => Some('-'),
            '*' | '?' | '"' | '<' | '>' | '|' => None,
            c => Some(c),
        })
        .collect();
    format!("{}_sermon_{range}", sermon_date.format(DATE_FORMAT))
}

/// Render the document body.
#[must_use]
pub fn render_document(results: &ResultSet, bible_range: &str, sermon_date: NaiveDate) -> String {
    let mut doc = format!(
        "# {DOCUMENT_TITLE}\n\n**Passage:** {}\n\n**Date:** {}\n",
        bible_range.trim(),
        sermon_date.format(DATE_FORMAT)
    );

    for (key, heading) in DOCUMENT_SECTIONS {
        if let Some(content) = results.content(key) {
            doc.push_str(&format!("\n---\n\n## {heading}\n\n{}\n", content.trim()));
        }
    }
    doc
}

impl Exporter for MarkdownExporter {
    fn export(
        &self,
        results: &ResultSet,
        bible_range: &str,
        sermon_date: NaiveDate,
    ) -> Result<Utf8PathBuf, SermonError> {
        let path = self
            .output_dir
            .join(format!("{}.md", document_stem(bible_range, sermon_date)));
        let body = render_document(results, bible_range, sermon_date);
        write_file_atomic(&path, &body)
            .map_err(|e| SermonError::Export(format!("{path}: {e:#}")))?;
        info!(path = %path, "Exported sermon document");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::StageResult;
    use sermon_utils::types::StageId;
    use std::fs;
    use tempfile::TempDir;

    fn results(upto: usize) -> ResultSet {
        let mut set = ResultSet::new();
        for stage in StageId::ALL.into_iter().take(upto) {
            set.push(StageResult {
                stage,
                content: format!("{} body\n", stage.key().to_uppercase()),
                persisted_path: Utf8PathBuf::from("unused"),
            });
        }
        set
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn test_document_stem() {
        assert_eq!(
            document_stem("Ezekiel 36:24-28", date()),
            "2026-03-01_sermon_Ezekiel_36.24-28"
        );
        assert_eq!(
            document_stem("  에스겔  36-37장 ", date()),
            "2026-03-01_sermon_에스겔_36-37장"
        );
        assert_eq!(document_stem("John 3/16", date()), "2026-03-01_sermon_John_3-16");
    }

    #[test]
    fn test_full_document_order() {
        let doc = render_document(&results(5), "Ezekiel 36", date());

        assert!(doc.starts_with("# Sermon Manuscript\n"));
        assert!(doc.contains("**Passage:** Ezekiel 36"));
        assert!(doc.contains("**Date:** 2026-03-01"));

        let body = doc.find("PHASE5 body").unwrap();
        let appendix_a = doc.find("PHASE1 body").unwrap();
        let appendix_b = doc.find("PHASE3 body").unwrap();
        assert!(body < appendix_a && appendix_a < appendix_b);
        assert!(!doc.contains("PHASE2 body"));
        assert!(!doc.contains("PHASE4 body"));
    }

    #[test]
    fn test_partial_results_are_tolerated() {
        let doc = render_document(&results(2), "Ezekiel 36", date());
        assert!(!doc.contains("Final Sermon"));
        assert!(doc.contains("Appendix A: Text Selection"));
        assert!(!doc.contains("Appendix B"));

        let empty = render_document(&ResultSet::new(), "Ezekiel 36", date());
        assert!(!empty.contains("##"));
    }

    #[test]
    fn test_export_writes_file() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp.path().join("out")).unwrap();
        let exporter = MarkdownExporter::new(dir.clone());

        let path = exporter.export(&results(5), "Ezekiel 36", date()).unwrap();

        assert_eq!(path, dir.join("2026-03-01_sermon_Ezekiel_36.md"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            render_document(&results(5), "Ezekiel 36", date())
        );
    }
}
