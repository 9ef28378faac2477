//! The end-to-end pipeline one migration job runs through: shape URLs, move
//! git refs, then walk through whichever metadata actions were requested.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use migrate_types::{JobRecord, MigrationRequest, Provider};
use serde_json::{json, Value};

use crate::bitbucket::BitbucketAdapter;
use crate::context::{shape_auth_url, RepoContext};
use crate::error::{MigrationError, Result};
use crate::github::GitHubAdapter;
use crate::gitlab::GitLabAdapter;
use crate::job_store::JobStore;
use crate::provider_adapter::ProviderAdapter;
use crate::redact::redact_in;
use crate::transport;

/// Holds one shared adapter per provider so every job reuses the same
/// connection pool instead of building a fresh `reqwest::Client` per run.
#[derive(Clone)]
pub struct Adapters {
    github: Arc<GitHubAdapter>,
    gitlab: Arc<GitLabAdapter>,
    bitbucket: Arc<BitbucketAdapter>,
}

impl Adapters {
    pub fn new() -> Self {
        Self {
            github: Arc::new(GitHubAdapter::new()),
            gitlab: Arc::new(GitLabAdapter::new()),
            bitbucket: Arc::new(BitbucketAdapter::new()),
        }
    }

    pub fn get(&self, provider: Provider) -> Arc<dyn ProviderAdapter> {
        match provider {
            Provider::GitHub => self.github.clone(),
            Provider::GitLab => self.gitlab.clone(),
            Provider::Bitbucket => self.bitbucket.clone(),
        }
    }
}

impl Default for Adapters {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs one job end to end and records its final state in `job_store`.
///
/// Every exit path — success, a provider error, or a git failure — removes
/// the scratch clone directory via [`transport::TempRepoGuard`]'s `Drop`
/// before this function returns.
pub async fn run(
    job_store: &JobStore,
    adapters: &Adapters,
    temp_root: &Path,
    job_id: &str,
    request: &MigrationRequest,
) {
    tracing::info!(job_id, source = %request.source_type, dest = %request.dest_type, "migration job starting");
    job_store.update_status(job_id, migrate_types::JobStatus::Processing, None);

    match run_inner(adapters, temp_root, job_id, request).await {
        Ok(results) => {
            tracing::info!(job_id, "migration job completed");
            job_store.complete(job_id, results);
        }
        Err(err) => {
            let message = redact_in(&err.to_string(), &[&request.source_token, &request.dest_token]);
            tracing::warn!(job_id, error = %message, "migration job failed");
            job_store.fail(job_id, message);
        }
    }
}

async fn run_inner(
    adapters: &Adapters,
    temp_root: &Path,
    job_id: &str,
    request: &MigrationRequest,
) -> Result<BTreeMap<String, Value>> {
    let actions = request.actions.normalized();

    let source_auth = shape_auth_url(&request.source_repo_url, &request.source_token, request.source_type)?;
    let dest_auth = shape_auth_url(&request.dest_repo_url, &request.dest_token, request.dest_type)?;

    let source_ctx = RepoContext::new(request.source_type, request.source_token.clone(), request.source_repo_url.clone())?;
    let dest_ctx = RepoContext::new(request.dest_type, request.dest_token.clone(), request.dest_repo_url.clone())?;

    let guard = transport::job_clone_dir(temp_root, job_id, &request.source_repo_url)?;
    let clone_path = guard.path().to_path_buf();

    let transport_report = {
        let clone_path = clone_path.clone();
        let actions = actions.clone();
        tokio::task::spawn_blocking(move || -> Result<transport::TransportReport> {
            transport::prepare_clone(&clone_path, &source_auth, &dest_auth)?;
            transport::push_refs(&clone_path, &actions)
        })
        .await
        .map_err(|e| MigrationError::InternalError(format!("git worker task panicked: {e}")))??
    };

    let mut results = BTreeMap::new();
    apply_transport_report(&mut results, &transport_report);

    if actions.migrate_issues {
        results.insert(
            "issues".to_string(),
            migrate_issues(adapters, &source_ctx, &dest_ctx).await?,
        );
    }

    if actions.migrate_prs {
        results.insert(
            "prs".to_string(),
            migrate_pull_requests(adapters, &source_ctx, &dest_ctx).await?,
        );
    }

    if actions.migrate_users {
        results.insert(
            "users".to_string(),
            migrate_users(adapters, &source_ctx, &dest_ctx).await?,
        );
    }

    // The guard's Drop removes clone_path once it goes out of scope here.
    drop(guard);

    Ok(results)
}

fn apply_transport_report(results: &mut BTreeMap<String, Value>, report: &transport::TransportReport) {
    if let Some(outcome) = report.repository {
        results.insert("repository".to_string(), json!(outcome));
    }
    if let Some(outcome) = report.branches {
        results.insert("branches".to_string(), json!(outcome));
    }
    if let Some(outcome) = report.tags {
        results.insert("tags".to_string(), json!(outcome));
    }
    if !report.specific_branches_pushed.is_empty() {
        results.insert(
            "specific_branches".to_string(),
            json!({ "pushed": report.specific_branches_pushed }),
        );
    }
    if !report.specific_branches_missing.is_empty() {
        results.insert(
            "specific_branches_missing".to_string(),
            json!(report.specific_branches_missing),
        );
    }
}

async fn migrate_issues(adapters: &Adapters, source: &RepoContext, destination: &RepoContext) -> Result<Value> {
    let source_adapter = adapters.get(source.provider);
    let dest_adapter = adapters.get(destination.provider);

    let items = match source_adapter.list_issues(source).await {
        Ok(items) => items,
        Err(MigrationError::UnsupportedProvider(message)) => return Ok(unsupported(&message)),
        Err(err) => return Err(err),
    };

    let mut created = 0u32;
    let mut failed = 0u32;
    for issue in &items {
        match dest_adapter.create_issue(destination, issue).await {
            Ok(()) => created += 1,
            Err(_) => failed += 1,
        }
    }

    Ok(json!({
        "status": "completed",
        "source_count": items.len(),
        "created": created,
        "failed": failed,
    }))
}

async fn migrate_pull_requests(adapters: &Adapters, source: &RepoContext, destination: &RepoContext) -> Result<Value> {
    let source_adapter = adapters.get(source.provider);
    let dest_adapter = adapters.get(destination.provider);

    let items = match source_adapter.list_pull_requests(source).await {
        Ok(items) => items,
        Err(MigrationError::UnsupportedProvider(message)) => return Ok(unsupported(&message)),
        Err(err) => return Err(err),
    };

    let mut created = 0u32;
    let mut skipped = 0u32;
    let mut failed = 0u32;
    for pr in &items {
        if !pr.has_branches() {
            skipped += 1;
            continue;
        }
        match dest_adapter.create_pull_request(destination, pr).await {
            Ok(()) => created += 1,
            Err(_) => failed += 1,
        }
    }

    Ok(json!({
        "status": "completed",
        "source_count": items.len(),
        "created": created,
        "skipped": skipped,
        "failed": failed,
    }))
}

async fn migrate_users(adapters: &Adapters, source: &RepoContext, destination: &RepoContext) -> Result<Value> {
    let source_adapter = adapters.get(source.provider);
    let dest_adapter = adapters.get(destination.provider);

    let usernames = match source_adapter.list_usernames(source).await {
        Ok(usernames) => usernames,
        Err(MigrationError::UnsupportedProvider(message)) => return Ok(unsupported(&message)),
        Err(err) => return Err(err),
    };

    // Bitbucket has no "does this user exist" endpoint; fetch its username
    // set once and reuse it instead of re-deriving it per candidate.
    let destination_bitbucket_users = if destination.provider == Provider::Bitbucket {
        Some(dest_adapter.list_usernames(destination).await?)
    } else {
        None
    };

    let mut mapped = Vec::new();
    let mut unmapped = Vec::new();

    for username in &usernames {
        let exists = if let Some(known) = &destination_bitbucket_users {
            known.iter().any(|candidate| candidate == username)
        } else {
            dest_adapter.user_exists(destination, username).await.unwrap_or(false)
        };

        if exists {
            mapped.push(username.clone());
        } else {
            unmapped.push(username.clone());
        }
    }

    Ok(json!({
        "status": "completed",
        "source_count": usernames.len(),
        "mapped_count": mapped.len(),
        "unmapped_count": unmapped.len(),
        "mapped_sample": mapped.into_iter().take(20).collect::<Vec<_>>(),
        "unmapped_sample": unmapped.into_iter().take(20).collect::<Vec<_>>(),
        "note": "This step maps usernames only; it does not create destination users.",
    }))
}

fn unsupported(message: &str) -> Value {
    json!({ "status": "unsupported", "message": message })
}

/// A fresh, still-pending job record for a just-accepted request.
pub fn new_job_record(scheduled: bool) -> JobRecord {
    if scheduled {
        JobRecord::scheduled()
    } else {
        JobRecord::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_shapes_the_status_payload() {
        let value = unsupported("nope");
        assert_eq!(value["status"], "unsupported");
        assert_eq!(value["message"], "nope");
    }

    #[test]
    fn new_job_record_picks_pending_or_scheduled() {
        assert_eq!(new_job_record(false).status, migrate_types::JobStatus::Pending);
        assert_eq!(new_job_record(true).status, migrate_types::JobStatus::Scheduled);
    }
}
