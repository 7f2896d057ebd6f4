//! Word-processor (`.docx`) export.
//!
//! The document opens with a title page (title, passage, date), followed by
//! the final sermon and the selection and review appendices, each on its own
//! page. Stage output is lightly parsed so Markdown headings, bullet lists
//! and `**bold**` runs keep their structure.

use std::io::Cursor;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use docx_rs::{
    AlignmentType, BreakType, Docx, PageMargin, Paragraph, Run, RunFonts, Style, StyleType,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use sermon_utils::atomic_write::write_bytes_atomic;
use sermon_utils::error::SermonError;

use crate::export::{DOCUMENT_SECTIONS, DOCUMENT_TITLE, Exporter, document_stem};
use crate::results::ResultSet;

const BODY_FONT: &str = "Malgun Gothic";
const CODE_FONT: &str = "Consolas";
const HEADING_COLOR: &str = "1A1A2E";
const BODY_COLOR: &str = "333333";

/// 2.5 cm in twentieths of a point.
const PAGE_MARGIN_TWIPS: i32 = 1417;

/// Blank paragraphs above the title on the cover page.
const TITLE_TOP_PADDING: usize = 6;

#[allow(clippy::expect_used)]
static BOLD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));

#[allow(clippy::expect_used)]
static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s").expect("valid regex"));

/// Leading symbols that mark a metadata line (passage, time, date, key point).
const META_MARKERS: [char; 12] = [
    '📖', '📌', '⏱', '📅', '📋', '🔑', '✅', '🌟', '🔧', '💡', '⭐', '🎯',
];

/// A piece of inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }
}

/// Structural element recognised in stage output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Heading level 1 to 3.
    Heading { level: u8, text: String },
    Bullet(Vec<Span>),
    Numbered(Vec<Span>),
    /// A metadata line rendered in bold.
    Meta(String),
    /// One line of a fenced code block.
    Code(String),
    Paragraph(Vec<Span>),
}

/// Split stage output into blocks.
///
/// `═══` rules are dropped. A line framed by two `───` rules becomes a level 2
/// heading. Fenced code is kept line by line.
#[must_use]
pub fn parse_blocks(content: &str) -> Vec<Block> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.is_empty() || line.starts_with("═══") {
            i += 1;
            continue;
        }

        if line.starts_with("───") {
            if let (Some(title), Some(closing)) = (lines.get(i + 1), lines.get(i + 2))
                && !title.is_empty()
                && !title.starts_with("───")
                && closing.starts_with("───")
            {
                blocks.push(Block::Heading {
                    level: 2,
                    text: strip_bold(title),
                });
                i += 3;
            } else {
                i += 1;
            }
            continue;
        }

        if line.starts_with("```") {
            i += 1;
            while i < lines.len() && !lines[i].starts_with("```") {
                blocks.push(Block::Code(lines[i].to_string()));
                i += 1;
            }
            i += 1;
            continue;
        }

        blocks.push(classify_line(line));
        i += 1;
    }

    blocks
}

fn classify_line(line: &str) -> Block {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes > 0 && line[hashes..].starts_with(' ') {
        let level = u8::try_from(hashes.min(3)).unwrap_or(3);
        return Block::Heading {
            level,
            text: strip_bold(line[hashes..].trim()),
        };
    }

    if line.starts_with(META_MARKERS) {
        return Block::Meta(strip_bold(line));
    }

    for marker in ["• ", "- ", "* ", "□ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Block::Bullet(inline_spans(rest.trim()));
        }
    }

    if let Some(found) = NUMBERED_ITEM.find(line) {
        let mut spans = inline_spans(&line[found.end()..]);
        spans.insert(0, Span::plain(found.as_str()));
        return Block::Numbered(spans);
    }

    Block::Paragraph(inline_spans(line))
}

/// Split a line into plain and `**bold**` spans.
#[must_use]
pub fn inline_spans(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for captures in BOLD_RUN.captures_iter(line) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span::plain(&line[last..whole.start()]));
        }
        spans.push(Span {
            text: inner.as_str().to_string(),
            bold: true,
        });
        last = whole.end();
    }
    if last < line.len() {
        spans.push(Span::plain(&line[last..]));
    }
    spans
}

fn strip_bold(text: &str) -> String {
    text.replace("**", "")
}

/// Writes a `.docx` document into the output directory.
#[derive(Debug, Clone)]
pub struct DocxExporter {
    output_dir: Utf8PathBuf,
}

impl DocxExporter {
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

impl Exporter for DocxExporter {
    fn export(
        &self,
        results: &ResultSet,
        bible_range: &str,
        sermon_date: NaiveDate,
    ) -> Result<Utf8PathBuf, SermonError> {
        let path = self
            .output_dir
            .join(format!("{}.docx", document_stem(bible_range, sermon_date)));

        let bytes = pack(build_document(results, bible_range, sermon_date))
            .map_err(|e| SermonError::Export(format!("{path}: {e:#}")))?;
        write_bytes_atomic(&path, &bytes)
            .map_err(|e| SermonError::Export(format!("{path}: {e:#}")))?;

        info!(path = %path, bytes = bytes.len(), "Exported sermon document");
        Ok(path)
    }
}

/// Assemble the document in memory.
#[must_use]
pub fn build_document(results: &ResultSet, bible_range: &str, sermon_date: NaiveDate) -> Docx {
    let mut docx = Docx::new()
        .default_fonts(body_fonts(BODY_FONT))
        .default_size(24)
        .page_margin(
            PageMargin::new()
                .top(PAGE_MARGIN_TWIPS)
                .bottom(PAGE_MARGIN_TWIPS)
                .left(PAGE_MARGIN_TWIPS)
                .right(PAGE_MARGIN_TWIPS),
        )
        .add_style(heading_style(1, 44))
        .add_style(heading_style(2, 32))
        .add_style(heading_style(3, 26));

    docx = add_title_page(docx, bible_range, sermon_date);

    let present: Vec<_> = DOCUMENT_SECTIONS
        .iter()
        .filter_map(|(key, heading)| results.content(key).map(|content| (*heading, content)))
        .collect();

    for (n, (heading, content)) in present.iter().enumerate() {
        docx = docx.add_paragraph(heading_paragraph(1, heading));
        for block in parse_blocks(content) {
            docx = docx.add_paragraph(block_paragraph(block));
        }
        if n + 1 < present.len() {
            docx = docx.add_paragraph(page_break());
        }
    }

    docx
}

fn add_title_page(mut docx: Docx, bible_range: &str, sermon_date: NaiveDate) -> Docx {
    for _ in 0..TITLE_TOP_PADDING {
        docx = docx.add_paragraph(Paragraph::new());
    }
    docx.add_paragraph(centered(
        Run::new()
            .add_text(DOCUMENT_TITLE)
            .size(56)
            .bold()
            .color(HEADING_COLOR),
    ))
    .add_paragraph(centered(
        Run::new().add_text(bible_range.trim()).size(32).color("555555"),
    ))
    .add_paragraph(Paragraph::new())
    .add_paragraph(centered(
        Run::new()
            .add_text(sermon_date.format("%Y-%m-%d (%A)").to_string())
            .size(24)
            .color("888888"),
    ))
    .add_paragraph(page_break())
}

fn block_paragraph(block: Block) -> Paragraph {
    match block {
        Block::Heading { level, text } => heading_paragraph(level, &text),
        Block::Bullet(spans) => {
            let mut spans = spans;
            spans.insert(0, Span::plain("• "));
            span_paragraph(spans).indent(Some(360), None, None, None)
        }
        Block::Numbered(spans) => span_paragraph(spans).indent(Some(360), None, None, None),
        Block::Meta(text) => Paragraph::new().add_run(Run::new().add_text(text).bold().size(22)),
        Block::Code(text) => {
            Paragraph::new().add_run(Run::new().add_text(text).fonts(body_fonts(CODE_FONT)))
        }
        Block::Paragraph(spans) => span_paragraph(spans),
    }
}

fn span_paragraph(spans: Vec<Span>) -> Paragraph {
    spans.into_iter().fold(Paragraph::new(), |paragraph, span| {
        let run = Run::new().add_text(span.text).color(BODY_COLOR);
        paragraph.add_run(if span.bold { run.bold() } else { run })
    })
}

fn heading_paragraph(level: u8, text: &str) -> Paragraph {
    Paragraph::new()
        .style(&heading_style_id(level))
        .add_run(Run::new().add_text(text))
}

fn heading_style_id(level: u8) -> String {
    format!("Heading{level}")
}

fn heading_style(level: u8, size: usize) -> Style {
    Style::new(&heading_style_id(level), StyleType::Paragraph)
        .name(format!("Heading {level}"))
        .size(size)
        .bold()
        .color(HEADING_COLOR)
}

fn centered(run: Run) -> Paragraph {
    Paragraph::new().align(AlignmentType::Center).add_run(run)
}

fn page_break() -> Paragraph {
    Paragraph::new().add_run(Run::new().add_break(BreakType::Page))
}

fn body_fonts(name: &str) -> RunFonts {
    RunFonts::new().ascii(name).hi_ansi(name).east_asia(name)
}

fn pack(docx: Docx) -> anyhow::Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .context("Failed to package document")?;
    Ok(buffer.into_inner())
}
