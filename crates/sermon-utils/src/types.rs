use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Stage identifiers for the sermon generation pipeline.
///
/// Stages execute in a fixed order and each one may only read the output of
/// stages that precede it.
///
/// ```text
/// Selection → Outline → Review → Manuscript → Final
/// ```
///
/// # Example
///
/// ```rust
/// use sermon_utils::types::StageId;
///
/// assert_eq!(StageId::Selection.key(), "phase1");
/// assert_eq!(StageId::Final.index(), 5);
/// assert_eq!(StageId::Outline.next(), Some(StageId::Review));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    /// Stage 1: passage selection and theme development.
    Selection,
    /// Stage 2: outline elaboration sized to the speaking duration.
    Outline,
    /// Stage 3: integrated feedback and congregation simulation.
    Review,
    /// Stage 4: full manuscript drafting.
    Manuscript,
    /// Stage 5: final polish into the publishable package.
    Final,
}

impl StageId {
    /// All stages in execution order.
    pub const ALL: [StageId; 5] = [
        StageId::Selection,
        StageId::Outline,
        StageId::Review,
        StageId::Manuscript,
        StageId::Final,
    ];

    /// 1-based position of the stage in the pipeline.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Selection => 1,
            Self::Outline => 2,
            Self::Review => 3,
            Self::Manuscript => 4,
            Self::Final => 5,
        }
    }

    /// Result-map key (`"phase1"` .. `"phase5"`).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Selection => "phase1",
            Self::Outline => "phase2",
            Self::Review => "phase3",
            Self::Manuscript => "phase4",
            Self::Final => "phase5",
        }
    }

    /// Short label used in artifact file names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Selection => "selection",
            Self::Outline => "outline",
            Self::Review => "review",
            Self::Manuscript => "manuscript",
            Self::Final => "final",
        }
    }

    /// Human-readable stage name for progress output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Selection => "Text selection & theme development",
            Self::Outline => "Outline elaboration",
            Self::Review => "Integrated feedback & simulation",
            Self::Manuscript => "Manuscript drafting",
            Self::Final => "Final polish",
        }
    }

    #[must_use]
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index).checked_sub(1)?).copied()
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.key() == key)
    }

    /// The stage that runs after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Overall tone of the sermon.
///
/// Parsing accepts the English names and the Korean option values, ignoring
/// ASCII case.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Tone {
    /// Strong call to repentance and decision.
    #[strum(to_string = "challenge", serialize = "도전")]
    Challenge,
    /// Gentle grace and empathy.
    #[strum(to_string = "comfort", serialize = "위로")]
    Comfort,
    /// Teaching centered on original-language analysis.
    #[strum(to_string = "instruction", serialize = "교육")]
    Instruction,
    /// Conversational, close to daily life.
    #[default]
    #[strum(to_string = "everyday", serialize = "일상")]
    Everyday,
}

/// Target speaking duration.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum SermonLength {
    /// Dawn prayer or midweek service.
    #[strum(to_string = "15")]
    Fifteen,
    /// Short Sunday sermon.
    #[strum(to_string = "30")]
    Thirty,
    /// Regular Sunday sermon.
    #[default]
    #[strum(to_string = "40")]
    Forty,
    /// Special gathering.
    #[strum(to_string = "60")]
    Sixty,
}

impl SermonLength {
    pub const ALL: [SermonLength; 4] = [Self::Fifteen, Self::Thirty, Self::Forty, Self::Sixty];

    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            Self::Fifteen => 15,
            Self::Thirty => 30,
            Self::Forty => 40,
            Self::Sixty => 60,
        }
    }
}

/// Primary audience the manuscript is written for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum Audience {
    #[default]
    #[strum(to_string = "general", serialize = "일반")]
    General,
    #[strum(to_string = "elderly", serialize = "장년")]
    Elderly,
    #[strum(to_string = "youth", serialize = "청년")]
    Youth,
    #[strum(to_string = "new-convert", serialize = "new_convert", serialize = "새신자")]
    NewConvert,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    Config,
    Programmatic,
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Env => "env",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}
