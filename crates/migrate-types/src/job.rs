//! Job status records as exposed by the Job Store and the HTTP surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a migration job.
///
/// Transitions are monotonic within a single run: a non-terminal state moves
/// to `Processing`, then terminally to `Completed` or `Failed`. `NotFound` is
/// synthesized by the Job Store and never actually stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet picked up by a worker.
    Pending,
    /// Accepted as a periodic job, waiting for the scheduler's first fire.
    Scheduled,
    /// A worker is actively running the orchestrator for this job.
    Processing,
    /// The orchestrator finished without error.
    Completed,
    /// The orchestrator exited with an error.
    Failed,
    /// No record exists for the requested job identifier.
    NotFound,
}

impl JobStatus {
    /// Terminal statuses are the only ones a completed run may end in.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// The externally observable state of one migration invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Per-action outcome, keyed by action name (`"repository"`, `"branches"`,
    /// `"tags"`, `"specific_branches"`, `"specific_branches_missing"`,
    /// `"issues"`, `"prs"`, `"users"`).
    #[serde(default)]
    pub results: BTreeMap<String, serde_json::Value>,
    /// Redacted human-readable failure message. Set if and only if
    /// `status == Failed`.
    #[serde(default)]
    pub error: Option<String>,
}

impl JobRecord {
    /// A freshly accepted job in `Pending` state, no results, no error.
    pub fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            results: BTreeMap::new(),
            error: None,
        }
    }

    /// A freshly accepted periodic job in `Scheduled` state.
    pub fn scheduled() -> Self {
        Self {
            status: JobStatus::Scheduled,
            results: BTreeMap::new(),
            error: None,
        }
    }

    /// The synthetic record returned for an unknown job identifier.
    pub fn not_found() -> Self {
        Self {
            status: JobStatus::NotFound,
            results: BTreeMap::new(),
            error: None,
        }
    }

    /// Invariant check used by tests: `error.is_some() == (status == Failed)`.
    pub fn error_matches_status(&self) -> bool {
        self.error.is_some() == matches!(self.status, JobStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_has_no_error_and_empty_results() {
        let record = JobRecord::pending();
        assert_eq!(record.status, JobStatus::Pending);
        assert!(record.error.is_none());
        assert!(record.results.is_empty());
        assert!(record.error_matches_status());
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::Scheduled.is_terminal());
    }

    #[test]
    fn error_matches_status_invariant() {
        let mut record = JobRecord::pending();
        assert!(record.error_matches_status());

        record.status = JobStatus::Failed;
        assert!(!record.error_matches_status());

        record.error = Some("boom".to_string());
        assert!(record.error_matches_status());
    }
}
