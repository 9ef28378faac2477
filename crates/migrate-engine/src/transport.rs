//! Drives the `git` binary to move refs between a source and destination
//! authenticated URL.
//!
//! Every git invocation is blocking, so callers run this from
//! [`tokio::task::spawn_blocking`]. Each job gets its own bare clone under a
//! scratch root, removed on every exit path by [`TempRepoGuard`].

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use migrate_types::MigrationActions;

use crate::error::{MigrationError, Result};

const MIRROR_REMOTE: &str = "migration_dest";

/// Outcome of applying a [`MigrationActions`] push plan.
#[derive(Debug, Default)]
pub struct TransportReport {
    pub repository: Option<&'static str>,
    pub branches: Option<&'static str>,
    pub tags: Option<&'static str>,
    pub specific_branches_pushed: Vec<String>,
    pub specific_branches_missing: Vec<String>,
}

/// Owns the per-job clone directory and removes it on drop, regardless of
/// which exit path the orchestrator takes (success, provider error, panic).
pub struct TempRepoGuard {
    path: PathBuf,
}

impl TempRepoGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempRepoGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Derives the bare-clone directory name the same way the reference service
/// does: `<job_id>_<last path segment of repo_url without .git>`, defaulting
/// the basename to `"repository"` when the URL has no usable segment.
///
/// `root` is the configured working-tree root (`MIGRATE_TEMP_DIR`), created
/// if it does not already exist.
pub fn job_clone_dir(root: &Path, job_id: &str, source_repo_url: &str) -> Result<TempRepoGuard> {
    std::fs::create_dir_all(root)?;

    let basename = source_repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(|segment| segment.trim_end_matches(".git"))
        .filter(|segment| !segment.is_empty())
        .unwrap_or("repository");

    let path = root.join(format!("{job_id}_{basename}"));
    Ok(TempRepoGuard { path })
}

/// Clones `source_auth_url` as a bare repository into `path`, then points a
/// freshly created `migration_dest` remote at `dest_auth_url`.
///
/// Takes a plain path rather than a [`TempRepoGuard`] so it can run inside a
/// `spawn_blocking` closure, which needs an owned, `'static` argument.
pub fn prepare_clone(path: &Path, source_auth_url: &str, dest_auth_url: &str) -> Result<()> {
    run_git(None, &["clone", "--bare", source_auth_url, &path.to_string_lossy()])?;
    // Ignore failure: the remote won't exist on a fresh clone.
    let _ = run_git(Some(path), &["remote", "remove", MIRROR_REMOTE]);
    run_git(Some(path), &["remote", "add", MIRROR_REMOTE, dest_auth_url])?;
    Ok(())
}

/// Applies the action-driven push plan and reports what happened.
///
/// A full mirror takes precedence over every other ref-level action because
/// it already carries everything they would push individually.
pub fn push_refs(path: &Path, actions: &MigrationActions) -> Result<TransportReport> {
    let mut report = TransportReport::default();

    if actions.migrate_repo {
        run_git(Some(path), &["push", "--mirror", MIRROR_REMOTE])?;
        report.repository = Some("success");
        return Ok(report);
    }

    let mut did_something = false;

    if actions.migrate_branches {
        run_git(Some(path), &["push", MIRROR_REMOTE, "refs/heads/*:refs/heads/*"])?;
        report.branches = Some("success");
        did_something = true;
    }

    for branch in &actions.specific_branches {
        let ref_name = format!("refs/heads/{branch}");
        if run_git(Some(path), &["rev-parse", "--verify", &ref_name]).is_err() {
            report.specific_branches_missing.push(branch.clone());
            continue;
        }
        run_git(Some(path), &["push", MIRROR_REMOTE, &format!("{ref_name}:{ref_name}")])?;
        report.specific_branches_pushed.push(branch.clone());
        did_something = true;
    }

    if actions.migrate_tags {
        run_git(Some(path), &["push", MIRROR_REMOTE, "refs/tags/*:refs/tags/*"])?;
        report.tags = Some("success");
        did_something = true;
    }

    if !did_something {
        report.repository = Some("skipped");
    }

    Ok(report)
}

fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = command.output().map_err(|e| MigrationError::GitCommandError(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MigrationError::GitCommandError(stderr.trim().to_string()));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_root() -> PathBuf {
        std::env::temp_dir().join("migrate-engine-transport-tests")
    }

    #[test]
    fn clone_dir_strips_dot_git_suffix() {
        let guard = job_clone_dir(&test_root(), "job1", "https://github.com/acme/widgets.git").unwrap();
        assert!(guard.path().ends_with("job1_widgets"));
    }

    #[test]
    fn clone_dir_defaults_basename_when_url_has_no_segment() {
        let guard = job_clone_dir(&test_root(), "job2", "https://host/").unwrap();
        assert!(guard.path().ends_with("job2_repository"));
    }
}
