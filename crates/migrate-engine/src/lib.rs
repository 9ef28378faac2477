//! Migration engine: moves a repository's git history and, optionally, its
//! issues, pull/merge requests, and collaborator list between GitHub,
//! GitLab, and Bitbucket Cloud.
//!
//! [`MigrationEngine`] is the crate's single entry point. It owns the job
//! table and the set of currently running periodic jobs; the HTTP surface
//! that wraps it only needs to hold an `Arc<MigrationEngine>`.
//!
//! ```rust,ignore
//! use migrate_engine::MigrationEngine;
//! use migrate_types::MigrationRequest;
//!
//! # async fn run(request: MigrationRequest) {
//! let engine = MigrationEngine::new("./temp_repos");
//! let job_id = engine.submit(request).await;
//! let status = engine.status(&job_id);
//! # }
//! ```

mod bitbucket;
pub mod context;
pub mod error;
mod github;
mod gitlab;
mod http;
mod job_store;
pub mod orchestrator;
pub mod redact;
pub mod scheduler;
pub mod transport;

mod provider_adapter;

pub use error::{MigrationError, Result};
pub use job_store::JobStore;
pub use provider_adapter::ProviderAdapter;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use migrate_types::{JobRecord, MigrationRequest};
use parking_lot::Mutex;
use uuid::Uuid;

use orchestrator::Adapters;
use scheduler::PeriodicJob;

/// Owns job state and in-flight periodic schedules for the whole service.
#[derive(Clone)]
pub struct MigrationEngine {
    job_store: JobStore,
    adapters: Adapters,
    temp_root: PathBuf,
    periodic_jobs: Arc<Mutex<HashMap<String, PeriodicJob>>>,
}

impl MigrationEngine {
    /// `temp_root` is the working-tree root per-job bare clones are created
    /// under (the host's `MIGRATE_TEMP_DIR`).
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            job_store: JobStore::new(),
            adapters: Adapters::new(),
            temp_root: temp_root.into(),
            periodic_jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Accepts a one-shot migration request, runs it on a background task,
    /// and returns its job id immediately.
    pub fn submit(&self, request: MigrationRequest) -> String {
        let job_id = format!("manual_{}", Uuid::new_v4());
        self.job_store.upsert(job_id.clone(), orchestrator::new_job_record(false));

        let job_store = self.job_store.clone();
        let adapters = self.adapters.clone();
        let temp_root = self.temp_root.clone();
        let spawned_id = job_id.clone();
        tokio::spawn(async move {
            orchestrator::run(&job_store, &adapters, &temp_root, &spawned_id, &request).await;
        });

        job_id
    }

    /// Registers a periodic migration request that re-runs every
    /// `interval_minutes` minutes. Fails fast if the interval is invalid;
    /// the job row is only created once the interval passes validation.
    pub fn schedule(&self, request: MigrationRequest, interval_minutes: u64) -> Result<String> {
        if interval_minutes < 1 {
            return Err(MigrationError::InvalidInterval(format!(
                "interval_minutes must be >= 1, got {interval_minutes}"
            )));
        }

        let job_id = format!("sched_{}", Uuid::new_v4());
        self.job_store.upsert(job_id.clone(), orchestrator::new_job_record(true));

        let periodic = scheduler::spawn_periodic(
            self.job_store.clone(),
            self.adapters.clone(),
            self.temp_root.clone(),
            job_id.clone(),
            request,
            interval_minutes,
        )?;

        self.periodic_jobs.lock().insert(job_id.clone(), periodic);
        Ok(job_id)
    }

    /// Returns the current record for `job_id`, or a synthetic `NotFound`
    /// record if no job with that id was ever submitted.
    pub fn status(&self, job_id: &str) -> JobRecord {
        self.job_store.snapshot(job_id)
    }

    /// Stops every periodic job's loop without waiting for in-flight runs
    /// to finish. Called once, at process shutdown.
    pub fn shutdown(&self) {
        for (_, job) in self.periodic_jobs.lock().drain() {
            job.cancel();
            job.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrate_types::{JobStatus, MigrationActions, Provider};

    fn sample_request() -> MigrationRequest {
        MigrationRequest {
            source_type: Provider::GitHub,
            source_token: "tok".to_string(),
            source_repo_url: "https://github.com/acme/widgets".to_string(),
            dest_type: Provider::GitLab,
            dest_token: "tok".to_string(),
            dest_repo_url: "https://gitlab.com/acme/widgets".to_string(),
            actions: MigrationActions::default(),
        }
    }

    fn test_root() -> std::path::PathBuf {
        std::env::temp_dir().join("migrate-engine-lib-tests")
    }

    #[test]
    fn status_of_unknown_job_is_not_found() {
        let engine = MigrationEngine::new(test_root());
        assert_eq!(engine.status("nope").status, JobStatus::NotFound);
    }

    #[test]
    fn schedule_rejects_zero_interval_and_leaves_no_dangling_job() {
        let engine = MigrationEngine::new(test_root());
        let result = engine.schedule(sample_request(), 0);
        assert!(result.is_err());
    }
}
