//! Prompt builders, one per stage.
//!
//! Each builder is deterministic and performs no I/O. Empty required input is
//! a caller bug and panics.

use sermon_utils::types::{Audience, SermonLength, Tone};

/// Marker labels the selection stage must emit, one per line.
pub const SELECTED_PASSAGE_MARKER: &str = "Selected passage:";
pub const RECOMMENDED_THEME_MARKER: &str = "Recommended theme:";
pub const SELECTION_RATIONALE_MARKER: &str = "Selection rationale:";

/// Output rules shared by every stage.
const OUTPUT_RULES: &str = "

OUTPUT RULES:
1. Output the document itself, with no preamble such as 'Here is...' or 'I will...'.
2. Use Markdown headings for structure.
3. Write in the same language as the passage reference you were given.";

const SELECTION_SYSTEM: &str = "You are an experienced pastor and biblical scholar helping a preacher choose the preaching text for this week. You read passages in their literary and historical context, and you favour texts that speak to the congregation's present situation.";

const OUTLINE_SYSTEM: &str = "You are a homiletics professor turning a chosen text and theme into a preachable outline. Every main point is anchored in the text, carries one clear illustration, and ends in a concrete application.";

const REVIEW_SYSTEM: &str = "You are a panel of three reviewers reading a sermon outline together: a theologian checking faithfulness to the text, a seasoned preacher checking flow and clarity, and a church member listening from the pew. You simulate how the sermon will land and give specific, actionable feedback.";

const MANUSCRIPT_SYSTEM: &str = "You are a preacher writing a full sermon manuscript to be read aloud. You write in spoken sentences, keep transitions explicit, and let every illustration serve the text.";

const FINAL_SYSTEM: &str = "You are an editor preparing a sermon manuscript for the pulpit. You correct errors, tighten wording, keep the preacher's voice, and return the complete finished manuscript.";

/// System and user instructions for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompt {
    pub system_instruction: String,
    pub user_instruction: String,
}

impl StagePrompt {
    fn new(system_instruction: &str, user_instruction: String) -> Self {
        Self {
            system_instruction: system_instruction.to_string(),
            user_instruction,
        }
    }
}

/// Size of an outline for a given speaking duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineShape {
    pub main_points: u8,
    /// Approximate manuscript length in characters.
    pub target_chars: u32,
}

#[must_use]
pub const fn outline_shape(length: SermonLength) -> OutlineShape {
    match length {
        SermonLength::Fifteen => OutlineShape {
            main_points: 2,
            target_chars: 3_000,
        },
        SermonLength::Thirty => OutlineShape {
            main_points: 3,
            target_chars: 6_000,
        },
        SermonLength::Forty => OutlineShape {
            main_points: 3,
            target_chars: 8_000,
        },
        SermonLength::Sixty => OutlineShape {
            main_points: 4,
            target_chars: 12_000,
        },
    }
}

const fn tone_guidance(tone: Tone) -> &'static str {
    match tone {
        Tone::Challenge => {
            "Challenge: press for repentance and decision; make the call to respond explicit."
        }
        Tone::Comfort => "Comfort: speak gently; dwell on grace and on God's nearness in suffering.",
        Tone::Instruction => {
            "Instruction: teach; explain key words in the original language and the historical setting."
        }
        Tone::Everyday => {
            "Everyday: conversational and close to daily life; use ordinary situations as illustrations."
        }
    }
}

const fn audience_guidance(audience: Audience) -> &'static str {
    match audience {
        Audience::General => "A mixed congregation of all ages.",
        Audience::Elderly => {
            "Mature believers; honour their experience, keep sentences clear and the pace unhurried."
        }
        Audience::Youth => {
            "Young adults; address questions of identity, work and relationships directly."
        }
        Audience::NewConvert => {
            "New believers; avoid insider vocabulary and explain every church term you use."
        }
    }
}

fn require<'a>(value: &'a str, what: &str) -> &'a str {
    assert!(!value.trim().is_empty(), "{what} must not be empty");
    value.trim()
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Stage 1: choose the passage and develop candidate themes.
///
/// # Panics
///
/// Panics if `bible_range` is empty.
#[must_use]
pub fn selection_prompt(
    bible_range: &str,
    weekly_context: Option<&str>,
    history_hint: &str,
) -> StagePrompt {
    let bible_range = require(bible_range, "bible range");

    let mut user = format!(
        "# Passage Range\n\n{bible_range}\n\n\
         # Your Task\n\n\
         Select the preaching text for this week from the range above and develop it into sermon themes.\n\n\
         1. Choose one contiguous passage suited to a single sermon.\n\
         2. Summarise its context, structure and central message.\n\
         3. Propose one to three candidate themes, strongest first.\n\n\
         Begin your answer with these three lines, using the labels exactly as written:\n\n\
         {SELECTED_PASSAGE_MARKER} <book chapter:verse-verse>\n\
         {RECOMMENDED_THEME_MARKER} <one sentence>\n\
         {SELECTION_RATIONALE_MARKER} <one or two sentences>\n"
    );

    if let Some(context) = optional(weekly_context) {
        user.push_str(&format!(
            "\n# This Week in the Congregation\n\n{context}\n\nPrefer a passage and theme that speak to this situation.\n"
        ));
    }

    if !history_hint.trim().is_empty() {
        user.push_str(&format!(
            "\n# Recently Preached\n\n{}\n\nAvoid repeating these passages and themes unless the range leaves no alternative.\n",
            history_hint.trim()
        ));
    }

    user.push_str(OUTPUT_RULES);
    StagePrompt::new(SELECTION_SYSTEM, user)
}

/// Stage 2: expand the selection into an outline sized for `length`.
///
/// # Panics
///
/// Panics if `selection` is empty.
#[must_use]
pub fn outline_prompt(selection: &str, length: SermonLength) -> StagePrompt {
    let selection = require(selection, "selection output");
    let shape = outline_shape(length);

    let user = format!(
        "# Text Selection and Themes\n\n{selection}\n\n\
         # Your Task\n\n\
         Develop the recommended theme into a detailed sermon outline for a {minutes}-minute sermon.\n\n\
         - Title and one-sentence big idea\n\
         - Introduction with an opening hook\n\
         - Exactly {points} main points; for each: supporting verses, explanation, one illustration, one application\n\
         - Conclusion with a clear response for the listener\n\n\
         Plan for a finished manuscript of about {chars} characters.{OUTPUT_RULES}",
        minutes = length.minutes(),
        points = shape.main_points,
        chars = shape.target_chars,
    );

    StagePrompt::new(OUTLINE_SYSTEM, user)
}

/// Stage 3: review the outline and simulate its reception.
///
/// # Panics
///
/// Panics if `outline` is empty.
#[must_use]
pub fn review_prompt(outline: &str) -> StagePrompt {
    let outline = require(outline, "outline output");

    let user = format!(
        "# Sermon Outline\n\n{outline}\n\n\
         # Your Task\n\n\
         Review this outline as the panel.\n\n\
         1. Theological review: where does the outline go beyond or fall short of the text?\n\
         2. Homiletical review: is the flow clear, and does each point earn its place?\n\
         3. Listener simulation: describe how a listener hears the sermon from start to finish.\n\
         4. Revision list: numbered, concrete changes for the manuscript writer.{OUTPUT_RULES}"
    );

    StagePrompt::new(REVIEW_SYSTEM, user)
}

/// Inputs to the manuscript stage.
#[derive(Debug, Clone, Copy)]
pub struct ManuscriptInputs<'a> {
    pub outline: &'a str,
    pub review: &'a str,
    pub weekly_context: Option<&'a str>,
    pub tone: Tone,
    pub length: SermonLength,
    pub audience: Audience,
    pub feedback_hint: &'a str,
}

/// Stage 4: write the full manuscript from the outline and its review.
///
/// # Panics
///
/// Panics if the outline or review is empty.
#[must_use]
pub fn manuscript_prompt(inputs: &ManuscriptInputs<'_>) -> StagePrompt {
    let outline = require(inputs.outline, "outline output");
    let review = require(inputs.review, "review output");
    let shape = outline_shape(inputs.length);

    let mut user = format!(
        "# Sermon Outline\n\n{outline}\n\n\
         # Review and Revision List\n\n{review}\n\n\
         # Delivery\n\n\
         - Duration: {minutes} minutes (about {chars} characters)\n\
         - Tone: {tone}\n\
         - Audience: {audience}\n",
        minutes = inputs.length.minutes(),
        chars = shape.target_chars,
        tone = tone_guidance(inputs.tone),
        audience = audience_guidance(inputs.audience),
    );

    if let Some(context) = optional(inputs.weekly_context) {
        user.push_str(&format!(
            "\n# This Week in the Congregation\n\n{context}\n\nOpen the introduction from this situation and return to it in the final application.\n"
        ));
    }

    if !inputs.feedback_hint.trim().is_empty() {
        user.push_str(&format!(
            "\n# Feedback From Previous Sermons\n\n{}\n\nCarry these lessons into this manuscript.\n",
            inputs.feedback_hint.trim()
        ));
    }

    user.push_str(
        "\n# Your Task\n\n\
         Write the complete sermon manuscript, applying every item on the revision list. \
         Keep the outline's structure and headings, write every sentence as it will be spoken, \
         and end with a prayer.",
    );
    user.push_str(OUTPUT_RULES);

    StagePrompt::new(MANUSCRIPT_SYSTEM, user)
}

/// Stage 5: final polish for delivery on `sermon_date`.
///
/// # Panics
///
/// Panics if `manuscript` is empty.
#[must_use]
pub fn final_prompt(manuscript: &str, sermon_date: &str) -> StagePrompt {
    let manuscript = require(manuscript, "manuscript output");

    let mut user = format!("# Manuscript Draft\n\n{manuscript}\n\n");
    if !sermon_date.trim().is_empty() {
        user.push_str(&format!("# Delivery Date\n\n{}\n\n", sermon_date.trim()));
    }
    user.push_str(
        "# Your Task\n\n\
         Produce the final manuscript.\n\n\
         1. Correct spelling, grammar and Scripture references.\n\
         2. Remove repetition and smooth the transitions.\n\
         3. Put a title block at the top with the title, passage and delivery date.\n\
         4. Return the complete manuscript, not a list of changes.",
    );
    user.push_str(OUTPUT_RULES);

    StagePrompt::new(FINAL_SYSTEM, user)
}
