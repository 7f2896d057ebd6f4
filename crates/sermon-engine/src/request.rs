//! Validated run input.

use chrono::NaiveDate;

use sermon_utils::error::InputError;
use sermon_utils::types::{Audience, SermonLength, Tone};

/// Date format accepted on input and used for run directories.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One request to produce a sermon.
///
/// Immutable once the pipeline starts; [`RunRequest::validate`] runs before
/// any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub bible_range: String,
    pub sermon_date: Option<NaiveDate>,
    pub context: Option<String>,
    pub tone: Tone,
    pub length: SermonLength,
    pub audience: Audience,
}

impl RunRequest {
    pub fn new(bible_range: impl Into<String>) -> Self {
        Self {
            bible_range: bible_range.into(),
            sermon_date: None,
            context: None,
            tone: Tone::default(),
            length: SermonLength::default(),
            audience: Audience::default(),
        }
    }

    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.sermon_date = Some(date);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[must_use]
    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: SermonLength) -> Self {
        self.length = length;
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    /// # Errors
    ///
    /// Returns `InputError::EmptyRange` when the passage reference is blank.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.bible_range.trim().is_empty() {
            return Err(InputError::EmptyRange);
        }
        Ok(())
    }

    /// The delivery date, falling back to `today` when none was given.
    #[must_use]
    pub fn effective_date(&self, today: NaiveDate) -> NaiveDate {
        self.sermon_date.unwrap_or(today)
    }

    /// Weekly context with surrounding whitespace removed; blank counts as absent.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `InputError::InvalidDate` for anything else.
pub fn parse_date(value: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| InputError::InvalidDate {
        value: value.to_string(),
    })
}
