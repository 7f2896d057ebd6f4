//! Five-stage sermon pipeline.
//!
//! Stages run strictly in order. A stage starts only after the previous one
//! has returned and its output is on disk. Any failure stops the run; the
//! stages already completed stay on disk and are returned in the partial
//! [`ResultSet`] of the [`PipelineFailure`].

use std::sync::Arc;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Local, NaiveDate};
use tracing::{Instrument, info};

use sermon_config::Config;
use sermon_llm::Generator;
use sermon_phases::{Phase, PhaseContext, all_phases, missing_inputs};
use sermon_utils::error::SermonError;
use sermon_utils::logging::{log_stage_complete, log_stage_error, log_stage_start, stage_span};
use sermon_utils::progress::{ProgressReporter, TracingReporter};
use sermon_utils::types::StageId;

use crate::feedback::FeedbackStore;
use crate::history::HistoryLoader;
use crate::request::{DATE_FORMAT, RunRequest};
use crate::results::{ResultSet, StageResult};
use crate::store::{ArtifactStore, run_timestamp};

/// Hints computed once at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub history_hint: String,
    pub feedback_hint: String,
}

impl RunContext {
    /// Load both hints. Never fails; unusable files are skipped.
    #[must_use]
    pub fn load(history: &HistoryLoader, feedback: &FeedbackStore) -> Self {
        Self {
            history_hint: history.load().text,
            feedback_hint: feedback.load().text,
        }
    }
}

/// A completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results: ResultSet,
    pub run_dir: Utf8PathBuf,
    pub run_timestamp: String,
    pub sermon_date: NaiveDate,
}

/// A run that stopped early.
///
/// `partial` holds exactly the stages that completed, which are also on disk
/// under `run_dir`. Input validation failures carry no stage, no directory
/// and an empty result set.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct PipelineFailure {
    pub stage: Option<StageId>,
    pub partial: ResultSet,
    pub run_dir: Option<Utf8PathBuf>,
    #[source]
    pub source: SermonError,
}

impl PipelineFailure {
    fn before_start(source: impl Into<SermonError>) -> Self {
        Self {
            stage: None,
            partial: ResultSet::new(),
            run_dir: None,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn into_error(self) -> SermonError {
        self.source
    }
}

/// Runs the five generation stages for one request at a time.
pub struct SermonPipeline {
    generator: Arc<dyn Generator>,
    store: ArtifactStore,
    history: HistoryLoader,
    feedback: FeedbackStore,
    reporter: Arc<dyn ProgressReporter>,
}

impl SermonPipeline {
    pub fn new(
        generator: Arc<dyn Generator>,
        store: ArtifactStore,
        history: HistoryLoader,
        feedback: FeedbackStore,
    ) -> Self {
        Self {
            generator,
            store,
            history,
            feedback,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Wire a pipeline to the directories and history limit in `config`.
    pub fn from_config(config: &Config, generator: Arc<dyn Generator>) -> Self {
        let store = ArtifactStore::new(config.output_dir());
        let history = HistoryLoader::new(store.clone(), config.history.max_entries);
        let feedback = FeedbackStore::new(config.feedback_dir());
        Self::new(generator, store, history, feedback)
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run all five stages.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineFailure`] carrying the completed prefix of stages
    /// when validation, generation or persistence fails.
    pub async fn run(&self, request: &RunRequest) -> Result<RunOutcome, PipelineFailure> {
        request.validate().map_err(PipelineFailure::before_start)?;

        let now = Local::now();
        let run_id = run_timestamp(now);
        let sermon_date = request.effective_date(now.date_naive());

        info!(
            run_id = %run_id,
            bible_range = %request.bible_range,
            sermon_date = %sermon_date.format(DATE_FORMAT),
            tone = %request.tone,
            duration = %request.length,
            audience = %request.audience,
            "Starting sermon run"
        );

        let context = RunContext::load(&self.history, &self.feedback);
        let run_dir = self
            .store
            .prepare_date_dir(sermon_date)
            .map_err(PipelineFailure::before_start)?;

        let date_label = sermon_date.format("%Y-%m-%d (%A)").to_string();
        let mut results = ResultSet::new();

        for phase in all_phases() {
            let stage = phase.id();
            let ctx = StageRun {
                run_id: &run_id,
                run_dir: &run_dir,
                request,
                context: &context,
                sermon_date: &date_label,
            };

            match self
                .run_stage(phase, &ctx, &results)
                .instrument(stage_span(&run_id, stage))
                .await
            {
                Ok(result) => results.push(result),
                Err(source) => {
                    return Err(PipelineFailure {
                        stage: Some(stage),
                        partial: results,
                        run_dir: Some(run_dir),
                        source,
                    });
                }
            }
        }

        self.reporter.run_finished(&run_dir);
        info!(run_id = %run_id, path = %run_dir, "Sermon run complete");

        Ok(RunOutcome {
            results,
            run_dir,
            run_timestamp: run_id,
            sermon_date,
        })
    }

    async fn run_stage(
        &self,
        phase: &dyn Phase,
        run: &StageRun<'_>,
        results: &ResultSet,
    ) -> Result<StageResult, SermonError> {
        let stage = phase.id();

        let missing = missing_inputs(phase, results);
        if !missing.is_empty() {
            let missing: Vec<&str> = missing.iter().map(|s| s.key()).collect();
            return Err(anyhow::anyhow!(
                "{} requires output from {} which has not been produced",
                stage.key(),
                missing.join(", ")
            )
            .into());
        }

        self.reporter.stage_started(stage);
        log_stage_start(run.run_id, stage);
        let started = Instant::now();

        let prompt = phase.prompt(&PhaseContext {
            bible_range: run.request.bible_range.trim(),
            sermon_date: run.sermon_date,
            weekly_context: run.request.context(),
            tone: run.request.tone,
            length: run.request.length,
            audience: run.request.audience,
            history_hint: &run.context.history_hint,
            feedback_hint: &run.context.feedback_hint,
            outputs: results,
        });

        let generated = self
            .generator
            .generate(&prompt.system_instruction, &prompt.user_instruction)
            .await
            .map_err(|source| SermonError::Stage { stage, source });

        let outcome = generated.and_then(|content| {
            let path = self
                .store
                .persist(run.run_dir, run.run_id, stage, &content)?;
            Ok(StageResult {
                stage,
                content,
                persisted_path: path,
            })
        });

        let elapsed_ms = started.elapsed().as_millis();
        match &outcome {
            Ok(result) => {
                log_stage_complete(run.run_id, stage, elapsed_ms, result.persisted_path.as_str());
                self.reporter.stage_saved(stage, &result.persisted_path);
            }
            Err(e) => log_stage_error(run.run_id, stage, &e.to_string(), elapsed_ms),
        }
        outcome
    }
}

/// Per-run values every stage reads.
struct StageRun<'a> {
    run_id: &'a str,
    run_dir: &'a Utf8Path,
    request: &'a RunRequest,
    context: &'a RunContext,
    sermon_date: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sermon_utils::error::{GenerationError, LlmError};
    use sermon_utils::progress::{ProgressEvent, RecordingReporter};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Echoes a stage-specific reply, failing on the configured call.
    struct EchoGenerator {
        fail_on_call: Option<usize>,
        calls: Mutex<Vec<String>>,
    }

    impl EchoGenerator {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                fail_on_call,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn user_prompts(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(
            &self,
            _system_instruction: &str,
            user_instruction: &str,
        ) -> Result<String, GenerationError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(user_instruction.to_string());
            let n = calls.len();
            if Some(n) == self.fail_on_call {
                return Err(GenerationError::Fatal {
                    attempt: 1,
                    source: LlmError::ProviderAuth("gemini returned 401".to_string()),
                });
            }
            Ok(format!("STAGE-{n}-OUTPUT"))
        }
    }

    struct Fixture {
        _temp: TempDir,
        root: Utf8PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
            Self { _temp: temp, root }
        }

        fn pipeline(&self, generator: Arc<EchoGenerator>) -> SermonPipeline {
            let store = ArtifactStore::new(self.root.join("output"));
            SermonPipeline::new(
                generator,
                store.clone(),
                HistoryLoader::new(store, 5),
                FeedbackStore::new(self.root.join("feedback")),
            )
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_each_stage_feeds_the_next() {
        let fixture = Fixture::new();
        let generator = Arc::new(EchoGenerator::new(None));
        let pipeline = fixture.pipeline(generator.clone());

        let outcome = pipeline
            .run(&RunRequest::new("Ezekiel 36").with_date(date()))
            .await
            .unwrap();

        assert!(outcome.results.is_complete());
        assert_eq!(outcome.run_dir, fixture.root.join("output/2026-03-01"));

        let prompts = generator.user_prompts();
        assert_eq!(prompts.len(), 5);
        assert!(prompts[0].contains("Ezekiel 36"));
        assert!(prompts[1].contains("STAGE-1-OUTPUT"));
        assert!(prompts[2].contains("STAGE-2-OUTPUT"));
        assert!(prompts[3].contains("STAGE-2-OUTPUT") && prompts[3].contains("STAGE-3-OUTPUT"));
        assert!(prompts[4].contains("STAGE-4-OUTPUT") && prompts[4].contains("2026-03-01 (Sunday)"));
    }

    #[tokio::test]
    async fn test_failure_keeps_completed_prefix() {
        let fixture = Fixture::new();
        let generator = Arc::new(EchoGenerator::new(Some(3)));
        let reporter = Arc::new(RecordingReporter::new());
        let pipeline = fixture
            .pipeline(generator.clone())
            .with_reporter(reporter.clone());

        let failure = pipeline
            .run(&RunRequest::new("Ezekiel 36").with_date(date()))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Some(StageId::Review));
        assert_eq!(failure.partial.keys(), vec!["phase1", "phase2"]);
        assert!(matches!(
            failure.source,
            SermonError::Stage {
                stage: StageId::Review,
                ..
            }
        ));
        for result in &failure.partial {
            assert!(result.persisted_path.exists());
        }
        let run_dir = failure.run_dir.clone().unwrap();
        assert_eq!(run_dir.read_dir_utf8().unwrap().count(), 2);
        assert_eq!(generator.user_prompts().len(), 3);

        let events = reporter.events();
        assert!(events.contains(&ProgressEvent::StageStarted(StageId::Review)));
        assert!(!events.contains(&ProgressEvent::StageStarted(StageId::Manuscript)));
        assert!(!events.iter().any(|e| matches!(e, ProgressEvent::RunFinished(_))));
    }

    #[tokio::test]
    async fn test_invalid_request_touches_nothing() {
        let fixture = Fixture::new();
        let generator = Arc::new(EchoGenerator::new(None));
        let pipeline = fixture.pipeline(generator.clone());

        let failure = pipeline.run(&RunRequest::new("  ")).await.unwrap_err();

        assert!(failure.stage.is_none());
        assert!(failure.partial.is_empty());
        assert!(failure.run_dir.is_none());
        assert!(matches!(failure.into_error(), SermonError::Input(_)));
        assert!(generator.user_prompts().is_empty());
        assert!(!fixture.root.join("output").exists());
    }

    #[tokio::test]
    async fn test_hints_reach_prompts() {
        let fixture = Fixture::new();
        let feedback_dir = fixture.root.join("feedback");
        std::fs::create_dir_all(&feedback_dir).unwrap();
        std::fs::write(
            feedback_dir.join("2026-02-22_feedback_x.md"),
            "Illustrations ran long",
        )
        .unwrap();

        let generator = Arc::new(EchoGenerator::new(None));
        let pipeline = fixture.pipeline(generator.clone());

        pipeline
            .run(&RunRequest::new("Ezekiel 36").with_date(date()))
            .await
            .unwrap();
        let first = generator.user_prompts();
        assert!(first[3].contains("Illustrations ran long"));
        assert!(!first[0].contains("Recently Preached"));

        let generator = Arc::new(EchoGenerator::new(None));
        let pipeline = fixture.pipeline(generator.clone());
        pipeline
            .run(&RunRequest::new("Ezekiel 37").with_date(date()))
            .await
            .unwrap();
        let second = generator.user_prompts();
        assert!(second[0].contains("Recently Preached"));
        assert!(second[0].contains("STAGE-1-OUTPUT"));
    }

    #[test]
    fn test_run_context_load_on_empty_store() {
        let fixture = Fixture::new();
        let store = ArtifactStore::new(fixture.root.join("output"));
        let context = RunContext::load(
            &HistoryLoader::new(store, 5),
            &FeedbackStore::new(fixture.root.join("feedback")),
        );
        assert_eq!(context, RunContext::default());
    }
}
