//! The contract between the orchestrator and stage implementations.

use std::collections::BTreeMap;

use sermon_utils::types::{Audience, SermonLength, StageId, Tone};

use crate::prompts::StagePrompt;

/// Read access to the text produced by stages that have already completed.
pub trait StageOutputs {
    /// Raw text of `stage`, or `None` when it has not run.
    fn output(&self, stage: StageId) -> Option<&str>;
}

impl StageOutputs for BTreeMap<StageId, String> {
    fn output(&self, stage: StageId) -> Option<&str> {
        self.get(&stage).map(String::as_str)
    }
}

/// Everything a stage may read while building its prompt.
///
/// Hints are empty strings when no history or feedback exists.
#[derive(Clone, Copy)]
pub struct PhaseContext<'a> {
    pub bible_range: &'a str,
    /// Target delivery date as shown to the model.
    pub sermon_date: &'a str,
    pub weekly_context: Option<&'a str>,
    pub tone: Tone,
    pub length: SermonLength,
    pub audience: Audience,
    pub history_hint: &'a str,
    pub feedback_hint: &'a str,
    pub outputs: &'a dyn StageOutputs,
}

impl std::fmt::Debug for PhaseContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseContext")
            .field("bible_range", &self.bible_range)
            .field("sermon_date", &self.sermon_date)
            .field("weekly_context", &self.weekly_context)
            .field("tone", &self.tone)
            .field("length", &self.length)
            .field("audience", &self.audience)
            .field("history_hint_len", &self.history_hint.len())
            .field("feedback_hint_len", &self.feedback_hint.len())
            .finish_non_exhaustive()
    }
}

impl<'a> PhaseContext<'a> {
    /// Output of an upstream stage.
    ///
    /// # Panics
    ///
    /// Panics if the stage has not produced text. Callers check
    /// [`missing_inputs`] before building a prompt.
    #[must_use]
    pub fn require(&self, stage: StageId) -> &'a str {
        match self.outputs.output(stage) {
            Some(text) if !text.trim().is_empty() => text,
            _ => panic!("{} output is required but was not produced", stage.key()),
        }
    }
}

/// Core trait every pipeline stage implements.
pub trait Phase: Send + Sync {
    /// Returns the unique identifier for this stage
    fn id(&self) -> StageId;

    /// Returns the stages whose output this stage reads
    fn deps(&self) -> &'static [StageId];

    /// Build the system and user instructions for this stage.
    fn prompt(&self, ctx: &PhaseContext<'_>) -> StagePrompt;
}

/// Declared inputs of `phase` that have no usable output yet.
#[must_use]
pub fn missing_inputs(phase: &dyn Phase, outputs: &dyn StageOutputs) -> Vec<StageId> {
    phase
        .deps()
        .iter()
        .copied()
        .filter(|dep| {
            outputs
                .output(*dep)
                .is_none_or(|text| text.trim().is_empty())
        })
        .collect()
}
