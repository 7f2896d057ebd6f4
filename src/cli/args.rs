//! CLI argument definitions and parsing structures
//!
//! This module defines the command-line interface using clap derive: the
//! global configuration flags and one subcommand per user workflow.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

use sermon_utils::types::{Audience, SermonLength, Tone};

/// sermon-auto - five-stage sermon preparation with Gemini
#[derive(Parser, Debug)]
#[command(name = "sermon-auto")]
#[command(about = "Turn a Bible passage into a sermon manuscript through five generation stages")]
#[command(long_about = r#"
sermon-auto runs five generation stages in order, each building on the ones
before it, and saves every stage's output under a directory named after the
delivery date.

EXAMPLES:
  # Prompt for the passage, deliver next Sunday
  sermon-auto run

  # Fully specified run
  sermon-auto run --range "Ezekiel 36" --date 2026-03-01 --tone comfort --duration 30

  # Weekly context shapes the introduction and applications
  sermon-auto run --range "Romans 8" --context "Several members lost their jobs this month"

  # Record feedback after preaching
  sermon-auto feedback --date 2026-03-01

  # Show what the next run will be told to avoid
  sermon-auto history --limit 3

  # Show effective configuration and where each value came from
  sermon-auto config

CONFIGURATION:
  Precedence: CLI flags > environment > config file > defaults
  Config file is discovered by searching upward from CWD for .sermon-auto/config.toml
  The API key is read from GEMINI_API_KEY (or the variable named by llm.api_key_env)

STAGES:
  Selection → Outline → Review → Manuscript → Final
"#)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Gemini model id
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory for stage artifacts and exported documents
    #[arg(long, global = true)]
    pub output_dir: Option<Utf8PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run all five stages for a passage
    Run(RunArgs),

    /// Record feedback on a preached sermon
    Feedback {
        /// Date the sermon was preached (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// Print the history hint the next run would use
    History {
        /// Number of previous selections to include (defaults to history.max_entries)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print effective configuration with sources
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Bible passage range, e.g. "Ezekiel 36-37" (prompted when omitted)
    #[arg(long = "range")]
    pub bible_range: Option<String>,

    /// Delivery date (YYYY-MM-DD); defaults to next Sunday
    #[arg(long)]
    pub date: Option<String>,

    /// This week's situation in the congregation
    #[arg(long)]
    pub context: Option<String>,

    /// Overall tone: challenge, comfort, instruction or everyday
    #[arg(long, default_value_t = Tone::Everyday)]
    pub tone: Tone,

    /// Speaking time in minutes: 15, 30, 40 or 60
    #[arg(long, default_value_t = SermonLength::Forty)]
    pub duration: SermonLength,

    /// Primary audience: general, elderly, youth or new-convert
    #[arg(long, default_value_t = Audience::General)]
    pub audience: Audience,

    /// Format of the combined document
    #[arg(long, value_enum, default_value_t = ExportFormat::Docx)]
    pub format: ExportFormat,

    /// Skip writing the combined document
    #[arg(long)]
    pub no_export: bool,
}

/// Combined document format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Word document with a title page and styled headings
    Docx,
    /// Plain Markdown
    Markdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["sermon-auto", "run", "--range", "Ezekiel 36"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.bible_range.as_deref(), Some("Ezekiel 36"));
        assert_eq!(args.tone, Tone::Everyday);
        assert_eq!(args.duration, SermonLength::Forty);
        assert_eq!(args.audience, Audience::General);
        assert!(args.date.is_none());
        assert!(!args.no_export);
        assert_eq!(args.format, ExportFormat::Docx);
    }

    #[test]
    fn test_run_format_selection() {
        let cli =
            Cli::try_parse_from(["sermon-auto", "run", "--format", "markdown", "--no-export"])
                .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.format, ExportFormat::Markdown);
        assert!(args.no_export);

        assert!(Cli::try_parse_from(["sermon-auto", "run", "--format", "pdf"]).is_err());
    }

    #[test]
    fn test_run_accepts_korean_option_values() {
        let cli = Cli::try_parse_from([
            "sermon-auto", "run", "--tone", "위로", "--duration", "15", "--audience", "새신자",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.tone, Tone::Comfort);
        assert_eq!(args.duration, SermonLength::Fifteen);
        assert_eq!(args.audience, Audience::NewConvert);
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        assert!(Cli::try_parse_from(["sermon-auto", "run", "--duration", "45"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sermon-auto",
            "config",
            "--model",
            "gemini-test",
            "--output-dir",
            "out",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("gemini-test"));
        assert_eq!(cli.output_dir.as_deref(), Some(camino::Utf8Path::new("out")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Config));
    }
}
