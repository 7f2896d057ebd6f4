//! Sermon pipeline orchestration
//!
//! Wires the stage prompt builders to a [`Generator`](sermon_llm::Generator),
//! persists every stage's raw output, and manages the history and feedback
//! stores that feed hints back into later runs.

pub mod docx;
pub mod export;
pub mod feedback;
pub mod history;
pub mod pipeline;
pub mod request;
pub mod results;
pub mod scan;
pub mod store;

pub use docx::DocxExporter;
pub use export::{DOCUMENT_SECTIONS, Exporter, MarkdownExporter, document_stem};
pub use feedback::{FEEDBACK_QUESTIONS, FeedbackEntry, FeedbackStore, NO_OPINION};
pub use history::HistoryLoader;
pub use pipeline::{PipelineFailure, RunContext, RunOutcome, SermonPipeline};
pub use request::{RunRequest, parse_date};
pub use results::{ResultSet, StageResult};
pub use scan::{Hint, ScanOutcome, ScanReport, SkipReason};
pub use store::{ArtifactStore, run_timestamp};
