//! The seam between the orchestrator and each provider's REST API.
//!
//! Every provider adapter is used symmetrically: the same implementation
//! reads from a repository when it's the source and writes to one when it's
//! the destination.

use async_trait::async_trait;
use migrate_types::{NormalizedIssue, NormalizedPullRequest};

use crate::context::RepoContext;
use crate::error::Result;

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Lists every issue on the repository, in whatever state the provider
    /// holds them in (normalization folds provider states into open/closed).
    async fn list_issues(&self, ctx: &RepoContext) -> Result<Vec<NormalizedIssue>>;

    /// Creates one issue, closing it immediately afterward if its normalized
    /// state is closed. A close failure does not unwind the creation.
    async fn create_issue(&self, ctx: &RepoContext, issue: &NormalizedIssue) -> Result<()>;

    /// Lists every pull/merge request on the repository.
    async fn list_pull_requests(&self, ctx: &RepoContext) -> Result<Vec<NormalizedPullRequest>>;

    /// Creates one pull/merge request, declining/closing it afterward if its
    /// normalized state is closed.
    async fn create_pull_request(&self, ctx: &RepoContext, pr: &NormalizedPullRequest) -> Result<()>;

    /// Lists every username this adapter can associate with the repository
    /// (collaborators, reviewers, watchers, or issue/PR participants,
    /// depending on what the provider exposes).
    async fn list_usernames(&self, ctx: &RepoContext) -> Result<Vec<String>>;

    /// Reports whether `username` is known to this provider/host. Bitbucket
    /// has no such lookup; callers should instead check membership in the
    /// set returned by [`ProviderAdapter::list_usernames`].
    async fn user_exists(&self, ctx: &RepoContext, username: &str) -> Result<bool>;
}
