//! Stage prompt builders and the phase contract
//!
//! The five builders in [`prompts`] are pure: they assemble a system
//! instruction and a user instruction from upstream stage text and run
//! options, and never touch the network or the filesystem. The [`Phase`]
//! trait wraps each builder with its declared inputs so the orchestrator can
//! check them before a prompt is built.

mod phase;
pub mod prompts;
mod stages;

pub use phase::{Phase, PhaseContext, StageOutputs, missing_inputs};
pub use prompts::{
    ManuscriptInputs, OutlineShape, StagePrompt, final_prompt, manuscript_prompt,
    outline_prompt, outline_shape, review_prompt, selection_prompt,
};
pub use sermon_utils::types::StageId;
pub use stages::{
    FinalPhase, ManuscriptPhase, OutlinePhase, ReviewPhase, SelectionPhase, all_phases,
    phase_for,
};
