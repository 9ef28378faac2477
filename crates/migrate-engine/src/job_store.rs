//! In-memory job table shared by the HTTP surface and the orchestrator.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use std::collections::BTreeMap;

use migrate_types::{JobRecord, JobStatus};

/// Thread-safe map of job id to its current record.
///
/// Every method takes and releases the lock within itself; callers never
/// hold it across an `.await`.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for `job_id`.
    pub fn upsert(&self, job_id: impl Into<String>, record: JobRecord) {
        self.jobs.write().insert(job_id.into(), record);
    }

    /// Returns a snapshot of `job_id`'s record, or a synthetic
    /// [`JobStatus::NotFound`] record if it isn't known.
    pub fn snapshot(&self, job_id: &str) -> JobRecord {
        self.jobs
            .read()
            .get(job_id)
            .cloned()
            .unwrap_or_else(JobRecord::not_found)
    }

    /// Mutates a job's status and error in place, leaving `results` alone
    /// unless `results` is supplied.
    pub fn update_status(&self, job_id: &str, status: JobStatus, error: Option<String>) {
        let mut jobs = self.jobs.write();
        if let Some(record) = jobs.get_mut(job_id) {
            record.status = status;
            record.error = error;
        }
    }

    /// Marks `job_id` completed with its final results.
    pub fn complete(&self, job_id: &str, results: BTreeMap<String, serde_json::Value>) {
        let mut jobs = self.jobs.write();
        if let Some(record) = jobs.get_mut(job_id) {
            record.status = JobStatus::Completed;
            record.results = results;
            record.error = None;
        }
    }

    /// Marks `job_id` failed with a redacted error message.
    pub fn fail(&self, job_id: &str, error: String) {
        let mut jobs = self.jobs.write();
        if let Some(record) = jobs.get_mut(job_id) {
            record.status = JobStatus::Failed;
            record.error = Some(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_job_reports_not_found() {
        let store = JobStore::new();
        let snapshot = store.snapshot("missing");
        assert_eq!(snapshot.status, JobStatus::NotFound);
    }

    #[test]
    fn upsert_then_snapshot_round_trips() {
        let store = JobStore::new();
        store.upsert("job1", JobRecord::pending());
        assert_eq!(store.snapshot("job1").status, JobStatus::Pending);
    }

    #[test]
    fn update_status_is_a_no_op_for_unknown_jobs() {
        let store = JobStore::new();
        store.update_status("missing", JobStatus::Processing, None);
        assert_eq!(store.snapshot("missing").status, JobStatus::NotFound);
    }
}
