//! `sermon-auto run`

use std::io::{BufRead, Write};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::info;

use sermon_engine::request::DATE_FORMAT;
use sermon_engine::{
    DocxExporter, Exporter, MarkdownExporter, PipelineFailure, RunRequest, SermonPipeline, parse_date,
};
use sermon_llm::generator_from_config;
use sermon_utils::progress::{ConsoleReporter, ProgressReporter};

use crate::cli::args::{ExportFormat, RunArgs};
use crate::cli::prompt::{Prompter, next_sunday, stdin_is_interactive};
use crate::{Config, SermonError};

/// Execute the five-stage pipeline and export the resulting document.
pub(crate) async fn execute_run_command(
    args: &RunArgs,
    config: &Config,
) -> Result<(), SermonError> {
    let reporter: Arc<dyn ProgressReporter> = Arc::new(ConsoleReporter);

    // A missing key must fail before any prompt or network traffic.
    let generator = generator_from_config(config, Arc::clone(&reporter))?;

    let today = Local::now().date_naive();
    let request = build_request(args, &mut Prompter::stdio(), stdin_is_interactive(), today)?;
    request.validate()?;

    let pipeline = SermonPipeline::from_config(config, Arc::new(generator)).with_reporter(reporter);
    let outcome = match pipeline.run(&request).await {
        Ok(outcome) => outcome,
        Err(failure) => {
            report_partial(&failure);
            return Err(failure.into_error());
        }
    };

    println!("Run directory: {}", outcome.run_dir);

    if args.no_export {
        info!("Skipping document export (--no-export)");
        return Ok(());
    }

    let exporter = exporter_for(args.format, config);
    let document = exporter.export(&outcome.results, &request.bible_range, outcome.sermon_date)?;
    println!("Document: {document}");
    Ok(())
}

fn exporter_for(format: ExportFormat, config: &Config) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Docx => Box::new(DocxExporter::new(config.output_dir())),
        ExportFormat::Markdown => Box::new(MarkdownExporter::new(config.output_dir())),
    }
}

/// Fill in whatever the flags left out.
///
/// The passage is always asked for when missing. Date and weekly context are
/// only asked for on a terminal; otherwise the date defaults to next Sunday
/// and the context stays empty.
fn build_request<R: BufRead, W: Write>(
    args: &RunArgs,
    prompter: &mut Prompter<R, W>,
    interactive: bool,
    today: NaiveDate,
) -> Result<RunRequest, SermonError> {
    let bible_range = match &args.bible_range {
        Some(range) => range.clone(),
        None => prompter.ask("Bible passage (e.g. Ezekiel 36-37)")?,
    };

    let default_date = next_sunday(today);
    let sermon_date = match &args.date {
        Some(date) => parse_date(date)?,
        None if interactive => {
            let default = default_date.format(DATE_FORMAT).to_string();
            parse_date(&prompter.ask_with_default("Sermon date", &default)?)?
        }
        None => default_date,
    };

    let context = match &args.context {
        Some(context) => Some(context.clone()),
        None if interactive => Some(prompter.ask("This week's congregation context (optional)")?),
        None => None,
    };

    let mut request = RunRequest::new(bible_range)
        .with_date(sermon_date)
        .with_tone(args.tone)
        .with_length(args.duration)
        .with_audience(args.audience);
    request.context = context;
    Ok(request)
}

fn report_partial(failure: &PipelineFailure) {
    let Some(run_dir) = &failure.run_dir else {
        return;
    };
    if failure.partial.is_empty() {
        eprintln!("No stage completed; nothing was kept in {run_dir}");
        return;
    }
    eprintln!("Completed stages kept in {run_dir}:");
    for result in &failure.partial {
        eprintln!("  {} {}", result.name(), result.persisted_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sermon_utils::error::InputError;
    use sermon_utils::types::{Audience, SermonLength, Tone};
    use std::io::Cursor;

    fn args() -> RunArgs {
        RunArgs {
            bible_range: None,
            date: None,
            context: None,
            tone: Tone::Comfort,
            duration: SermonLength::Thirty,
            audience: Audience::Youth,
            format: ExportFormat::Docx,
            no_export: false,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 23).unwrap()
    }

    fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn test_flags_skip_all_prompts() {
        let mut args = args();
        args.bible_range = Some("Ezekiel 36".to_string());
        args.date = Some("2026-03-08".to_string());
        args.context = Some("Flood relief week".to_string());
        let mut out = Vec::new();
        let mut prompter = Prompter::new(Cursor::new(""), &mut out);

        let request = build_request(&args, &mut prompter, true, monday()).unwrap();

        assert_eq!(request.bible_range, "Ezekiel 36");
        assert_eq!(request.sermon_date, NaiveDate::from_ymd_opt(2026, 3, 8));
        assert_eq!(request.context.as_deref(), Some("Flood relief week"));
        assert_eq!(request.tone, Tone::Comfort);
        assert_eq!(request.length, SermonLength::Thirty);
        assert_eq!(request.audience, Audience::Youth);
        assert!(out.is_empty());
    }

    #[test]
    fn test_interactive_prompts_use_next_sunday_default() {
        let mut prompter = Prompter::new(Cursor::new("Romans 8\n\n  \n"), Vec::new());

        let request = build_request(&args(), &mut prompter, true, monday()).unwrap();

        assert_eq!(request.bible_range, "Romans 8");
        assert_eq!(request.sermon_date, Some(sunday()));
        assert_eq!(request.context(), None);
    }

    #[test]
    fn test_non_interactive_defaults() {
        let mut prompter = Prompter::new(Cursor::new("Psalm 23\n"), Vec::new());

        let request = build_request(&args(), &mut prompter, false, monday()).unwrap();

        assert_eq!(request.bible_range, "Psalm 23");
        assert_eq!(request.sermon_date, Some(sunday()));
        assert!(request.context.is_none());
    }

    #[test]
    fn test_invalid_date_is_an_input_error() {
        let mut args = args();
        args.bible_range = Some("Psalm 23".to_string());
        args.date = Some("next week".to_string());
        let mut prompter = Prompter::new(Cursor::new(""), Vec::new());

        let err = build_request(&args, &mut prompter, false, monday()).unwrap_err();

        assert!(matches!(
            err,
            SermonError::Input(InputError::InvalidDate { ref value }) if value == "next week"
        ));
    }

    #[test]
    fn test_exporter_for_writes_selected_format() {
        let temp = tempfile::TempDir::new().unwrap();
        let out = camino::Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let config = Config::builder().api_key("k").output_dir(out.clone()).build().unwrap();
        let results = sermon_engine::ResultSet::new();

        let docx = exporter_for(ExportFormat::Docx, &config)
            .export(&results, "Psalm 23", sunday())
            .unwrap();
        let markdown = exporter_for(ExportFormat::Markdown, &config)
            .export(&results, "Psalm 23", sunday())
            .unwrap();

        assert_eq!(docx, out.join("2026-03-01_sermon_Psalm_23.docx"));
        assert_eq!(markdown, out.join("2026-03-01_sermon_Psalm_23.md"));
        assert!(docx.exists());
        assert!(markdown.exists());
    }

    #[test]
    fn test_blank_range_at_end_of_input_fails_validation() {
        let mut prompter = Prompter::new(Cursor::new(""), Vec::new());

        let request = build_request(&args(), &mut prompter, false, monday()).unwrap();

        assert!(matches!(request.validate(), Err(InputError::EmptyRange)));
    }
}
