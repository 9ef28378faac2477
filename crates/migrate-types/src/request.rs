//! Migration request payloads.

use serde::{Deserialize, Serialize};

use crate::provider::Provider;

/// Which parts of a repository to copy.
///
/// `migrate_repo = true` subsumes every ref-level flag below it: the transport
/// driver performs a single mirror push and the selective branch/tag fields
/// are not consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationActions {
    /// Mirror-push every ref (branches, tags, and deletions) in one step.
    #[serde(default = "default_true")]
    pub migrate_repo: bool,
    /// Push `refs/heads/*` verbatim.
    #[serde(default = "default_true")]
    pub migrate_branches: bool,
    /// Exact branch names to push individually, in addition to (or instead
    /// of) `migrate_branches`. De-duplicated and trimmed; see [`MigrationActions::normalized`].
    #[serde(default)]
    pub specific_branches: Vec<String>,
    /// Push `refs/tags/*` verbatim.
    #[serde(default = "default_true")]
    pub migrate_tags: bool,
    /// Fetch issues from the source and recreate them on the destination.
    #[serde(default)]
    pub migrate_issues: bool,
    /// Fetch pull/merge requests from the source and recreate them on the destination.
    #[serde(default)]
    pub migrate_prs: bool,
    /// Compute a source-to-destination username mapping report (read-only).
    #[serde(default)]
    pub migrate_users: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MigrationActions {
    fn default() -> Self {
        Self {
            migrate_repo: true,
            migrate_branches: true,
            specific_branches: Vec::new(),
            migrate_tags: true,
            migrate_issues: false,
            migrate_prs: false,
            migrate_users: false,
        }
    }
}

impl MigrationActions {
    /// Returns a copy with `specific_branches` de-duplicated and trimmed,
    /// preserving the order of first occurrence and discarding blank entries.
    pub fn normalized(&self) -> Self {
        let mut seen = std::collections::HashSet::new();
        let mut cleaned = Vec::new();
        for raw in &self.specific_branches {
            let branch = raw.trim();
            if branch.is_empty() || !seen.insert(branch.to_string()) {
                continue;
            }
            cleaned.push(branch.to_string());
        }
        Self {
            specific_branches: cleaned,
            ..self.clone()
        }
    }

    /// True if no ref-level action is selected at all (the transport step
    /// then records the repository outcome as `skipped`).
    pub fn no_ref_level_action(&self) -> bool {
        !self.migrate_repo
            && !self.migrate_branches
            && self.specific_branches.is_empty()
            && !self.migrate_tags
    }
}

/// A request to migrate one repository's contents and metadata to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRequest {
    /// Provider the source repository is hosted on.
    pub source_type: Provider,
    /// Credential used to authenticate against the source provider. For
    /// Bitbucket this may be `username:app_password`.
    pub source_token: String,
    /// Absolute (or scheme-less) HTTPS URL of the source repository.
    pub source_repo_url: String,
    /// Provider the destination repository is hosted on.
    pub dest_type: Provider,
    /// Credential used to authenticate against the destination provider.
    pub dest_token: String,
    /// Absolute (or scheme-less) HTTPS URL of the destination repository.
    pub dest_repo_url: String,
    /// Which parts of the repository and its metadata to copy.
    #[serde(default)]
    pub actions: MigrationActions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_actions_mirror_the_reference_defaults() {
        let actions = MigrationActions::default();
        assert!(actions.migrate_repo);
        assert!(actions.migrate_branches);
        assert!(actions.migrate_tags);
        assert!(!actions.migrate_issues);
        assert!(!actions.migrate_prs);
        assert!(!actions.migrate_users);
        assert!(actions.specific_branches.is_empty());
    }

    #[test]
    fn normalized_dedupes_trims_and_preserves_order() {
        let actions = MigrationActions {
            specific_branches: vec![
                "  main".to_string(),
                "main ".to_string(),
                "".to_string(),
                "   ".to_string(),
                "develop".to_string(),
                "main".to_string(),
            ],
            ..MigrationActions::default()
        };
        assert_eq!(
            actions.normalized().specific_branches,
            vec!["main".to_string(), "develop".to_string()]
        );
    }

    #[test]
    fn no_ref_level_action_detects_all_flags_off() {
        let actions = MigrationActions {
            migrate_repo: false,
            migrate_branches: false,
            migrate_tags: false,
            specific_branches: vec![],
            ..MigrationActions::default()
        };
        assert!(actions.no_ref_level_action());

        let with_specific = MigrationActions {
            specific_branches: vec!["main".to_string()],
            ..actions.clone()
        };
        assert!(!with_specific.no_ref_level_action());
    }
}
