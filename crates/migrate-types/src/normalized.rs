//! Provider-agnostic shapes used between listing and creation.

use serde::{Deserialize, Serialize};

/// Open/closed state shared by normalized issues and pull requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

impl ItemState {
    pub fn is_closed(&self) -> bool {
        matches!(self, ItemState::Closed)
    }
}

/// An issue in the normalized intermediate form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedIssue {
    pub title: String,
    pub description: String,
    pub state: ItemState,
    pub labels: Vec<String>,
}

impl NormalizedIssue {
    /// Title used when the source record has no title at all.
    pub const UNTITLED: &'static str = "Untitled issue";
}

/// A pull/merge request in the normalized intermediate form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPullRequest {
    pub title: String,
    pub description: String,
    pub source_branch: String,
    pub target_branch: String,
    pub state: ItemState,
    pub draft: bool,
}

impl NormalizedPullRequest {
    pub const UNTITLED: &'static str = "Untitled PR";

    /// A PR with either branch empty cannot be created on the destination
    /// and is skipped rather than failed.
    pub fn has_branches(&self) -> bool {
        !self.source_branch.is_empty() && !self.target_branch.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pr_without_branches_is_flagged_skippable() {
        let pr = NormalizedPullRequest {
            title: "x".into(),
            description: String::new(),
            source_branch: String::new(),
            target_branch: "main".into(),
            state: ItemState::Open,
            draft: false,
        };
        assert!(!pr.has_branches());
    }

    #[test]
    fn pr_with_both_branches_is_not_skippable() {
        let pr = NormalizedPullRequest {
            title: "x".into(),
            description: String::new(),
            source_branch: "feat/x".into(),
            target_branch: "main".into(),
            state: ItemState::Open,
            draft: false,
        };
        assert!(pr.has_branches());
    }
}
