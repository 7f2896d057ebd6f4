//! sermon-auto: a five-stage Gemini pipeline that turns a Bible passage into a
//! sermon manuscript.
//!
//! The binary is a thin wrapper around [`cli::run`]. Library users can drive
//! the pipeline directly:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sermon_auto::{CliArgs, Config, RunRequest, SermonPipeline};
//! use sermon_auto::progress::NullReporter;
//!
//! # async fn demo() -> Result<(), sermon_auto::SermonError> {
//! let config = Config::discover(&CliArgs::default())?;
//! let generator = sermon_llm::generator_from_config(&config, Arc::new(NullReporter))?;
//! let pipeline = SermonPipeline::from_config(&config, Arc::new(generator));
//!
//! let outcome = pipeline
//!     .run(&RunRequest::new("Ezekiel 36"))
//!     .await
//!     .map_err(|failure| failure.into_error())?;
//! println!("{}", outcome.run_dir);
//! # Ok(())
//! # }
//! ```

pub mod cli;

pub use sermon_config::{CliArgs, Config};
pub use sermon_engine::{
    Exporter, FeedbackEntry, FeedbackStore, HistoryLoader, MarkdownExporter, PipelineFailure,
    ResultSet, RunOutcome, RunRequest, SermonPipeline, StageResult,
};
pub use sermon_utils::error::{SermonError, UserFriendlyError};
pub use sermon_utils::exit_codes::ExitCode;
pub use sermon_utils::progress;
pub use sermon_utils::types::{Audience, SermonLength, StageId, Tone};
