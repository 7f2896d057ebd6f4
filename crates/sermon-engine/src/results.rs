//! Ordered stage results for a single run.

use camino::{Utf8Path, Utf8PathBuf};

use sermon_phases::StageOutputs;
use sermon_utils::types::StageId;

/// Output of one completed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub stage: StageId,
    pub content: String,
    pub persisted_path: Utf8PathBuf,
}

impl StageResult {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.stage.key()
    }

    #[must_use]
    pub fn persisted_path(&self) -> &Utf8Path {
        &self.persisted_path
    }
}

/// Stage results in execution order.
///
/// Always a prefix of `phase1..phase5`: results can only be appended, and
/// only for the stage that follows the last one recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    results: Vec<StageResult>,
}

impl ResultSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stage that must be recorded next, or `None` once all five are in.
    #[must_use]
    pub fn next_stage(&self) -> Option<StageId> {
        match self.results.last() {
            None => Some(StageId::Selection),
            Some(last) => last.stage.next(),
        }
    }

    /// Append the result of the next stage.
    ///
    /// # Panics
    ///
    /// Panics if `result` is not for [`ResultSet::next_stage`].
    pub fn push(&mut self, result: StageResult) {
        assert_eq!(
            Some(result.stage),
            self.next_stage(),
            "stage results must be recorded in order"
        );
        self.results.push(result);
    }

    #[must_use]
    pub fn get(&self, stage: StageId) -> Option<&StageResult> {
        self.results.iter().find(|r| r.stage == stage)
    }

    /// Content by stage key (`"phase1"`..`"phase5"`).
    #[must_use]
    pub fn content(&self, key: &str) -> Option<&str> {
        StageId::from_key(key)
            .and_then(|stage| self.get(stage))
            .map(|r| r.content.as_str())
    }

    /// Stage keys present, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        self.results.iter().map(StageResult::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageResult> {
        self.results.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.results.len() == StageId::ALL.len()
    }
}

impl StageOutputs for ResultSet {
    fn output(&self, stage: StageId) -> Option<&str> {
        self.get(stage).map(|r| r.content.as_str())
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a StageResult;
    type IntoIter = std::slice::Iter<'a, StageResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stage: StageId) -> StageResult {
        StageResult {
            stage,
            content: format!("{} text", stage.key()),
            persisted_path: Utf8PathBuf::from(format!("out/{}.md", stage.key())),
        }
    }

    #[test]
    fn test_push_in_order() {
        let mut set = ResultSet::new();
        assert_eq!(set.next_stage(), Some(StageId::Selection));

        for stage in StageId::ALL {
            set.push(result(stage));
        }

        assert!(set.is_complete());
        assert_eq!(set.next_stage(), None);
        assert_eq!(
            set.keys(),
            vec!["phase1", "phase2", "phase3", "phase4", "phase5"]
        );
        assert_eq!(set.content("phase3"), Some("phase3 text"));
        assert_eq!(set.content("phase9"), None);
        assert_eq!(set.output(StageId::Final), Some("phase5 text"));
    }

    #[test]
    #[should_panic(expected = "recorded in order")]
    fn test_push_out_of_order_panics() {
        let mut set = ResultSet::new();
        set.push(result(StageId::Selection));
        set.push(result(StageId::Review));
    }

    #[test]
    #[should_panic(expected = "recorded in order")]
    fn test_push_duplicate_panics() {
        let mut set = ResultSet::new();
        set.push(result(StageId::Selection));
        set.push(result(StageId::Selection));
    }

    #[test]
    fn test_partial_set() {
        let mut set = ResultSet::new();
        set.push(result(StageId::Selection));
        set.push(result(StageId::Outline));

        assert_eq!(set.len(), 2);
        assert!(!set.is_complete());
        assert_eq!(set.next_stage(), Some(StageId::Review));
        assert!(set.get(StageId::Review).is_none());
        assert_eq!((&set).into_iter().count(), 2);
    }
}
