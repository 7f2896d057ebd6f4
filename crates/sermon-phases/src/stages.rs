//! Concrete stage implementations
//!
//! Each stage reads its declared inputs from the [`PhaseContext`] and
//! delegates to the matching builder in [`crate::prompts`].

use sermon_utils::types::StageId;

use crate::phase::{Phase, PhaseContext};
use crate::prompts::{
    ManuscriptInputs, StagePrompt, final_prompt, manuscript_prompt, outline_prompt,
    review_prompt, selection_prompt,
};

/// Text selection and theme development.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionPhase;

impl Phase for SelectionPhase {
    fn id(&self) -> StageId {
        StageId::Selection
    }

    fn deps(&self) -> &'static [StageId] {
        &[]
    }

    fn prompt(&self, ctx: &PhaseContext<'_>) -> StagePrompt {
        selection_prompt(ctx.bible_range, ctx.weekly_context, ctx.history_hint)
    }
}

/// Outline elaboration sized to the requested duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlinePhase;

impl Phase for OutlinePhase {
    fn id(&self) -> StageId {
        StageId::Outline
    }

    fn deps(&self) -> &'static [StageId] {
        &[StageId::Selection]
    }

    fn prompt(&self, ctx: &PhaseContext<'_>) -> StagePrompt {
        outline_prompt(ctx.require(StageId::Selection), ctx.length)
    }
}

/// Integrated review and listener simulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewPhase;

impl Phase for ReviewPhase {
    fn id(&self) -> StageId {
        StageId::Review
    }

    fn deps(&self) -> &'static [StageId] {
        &[StageId::Outline]
    }

    fn prompt(&self, ctx: &PhaseContext<'_>) -> StagePrompt {
        review_prompt(ctx.require(StageId::Outline))
    }
}

/// Manuscript drafting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManuscriptPhase;

impl Phase for ManuscriptPhase {
    fn id(&self) -> StageId {
        StageId::Manuscript
    }

    fn deps(&self) -> &'static [StageId] {
        &[StageId::Outline, StageId::Review]
    }

    fn prompt(&self, ctx: &PhaseContext<'_>) -> StagePrompt {
        manuscript_prompt(&ManuscriptInputs {
            outline: ctx.require(StageId::Outline),
            review: ctx.require(StageId::Review),
            weekly_context: ctx.weekly_context,
            tone: ctx.tone,
            length: ctx.length,
            audience: ctx.audience,
            feedback_hint: ctx.feedback_hint,
        })
    }
}

/// Final polish for delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinalPhase;

impl Phase for FinalPhase {
    fn id(&self) -> StageId {
        StageId::Final
    }

    fn deps(&self) -> &'static [StageId] {
        &[StageId::Manuscript]
    }

    fn prompt(&self, ctx: &PhaseContext<'_>) -> StagePrompt {
        final_prompt(ctx.require(StageId::Manuscript), ctx.sermon_date)
    }
}

/// The stage implementation for `id`.
#[must_use]
pub fn phase_for(id: StageId) -> &'static dyn Phase {
    match id {
        StageId::Selection => &SelectionPhase,
        StageId::Outline => &OutlinePhase,
        StageId::Review => &ReviewPhase,
        StageId::Manuscript => &ManuscriptPhase,
        StageId::Final => &FinalPhase,
    }
}

/// All stages in execution order.
#[must_use]
pub fn all_phases() -> [&'static dyn Phase; 5] {
    StageId::ALL.map(phase_for)
}
