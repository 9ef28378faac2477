//! GitHub / GitHub Enterprise adapter.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};

use migrate_types::{ItemState, NormalizedIssue, NormalizedPullRequest};

use crate::context::RepoContext;
use crate::error::Result;
use crate::http;
use crate::provider_adapter::ProviderAdapter;

const PER_PAGE: u32 = 100;
const MAX_PAGES: u32 = 10;

pub struct GitHubAdapter {
    client: reqwest::Client,
}

impl GitHubAdapter {
    pub fn new() -> Self {
        Self {
            client: http::build_client(),
        }
    }

    fn headers(&self, token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static("2022-11-28"),
        );
        headers
    }
}

impl Default for GitHubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for GitHubAdapter {
    async fn list_issues(&self, ctx: &RepoContext) -> Result<Vec<NormalizedIssue>> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);
        let mut issues = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!("{api_base}/repos/{repo_path}/issues");
            let payload = http::request_json(
                &self.client,
                Method::GET,
                &url,
                headers.clone(),
                &[
                    ("state", "all".to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ],
                None,
            )
            .await?;

            let items = payload.as_array().cloned().unwrap_or_default();
            if items.is_empty() {
                break;
            }

            let page_len = items.len();
            for item in items {
                // GitHub returns PRs through the issues endpoint too.
                if item.get("pull_request").is_some() {
                    continue;
                }
                issues.push(normalize_issue(&item));
            }

            if page_len < PER_PAGE as usize {
                break;
            }
        }

        Ok(issues)
    }

    async fn create_issue(&self, ctx: &RepoContext, issue: &NormalizedIssue) -> Result<()> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);

        let body = json!({
            "title": issue.title,
            "body": issue.description,
            "labels": issue.labels,
        });

        let created = http::request_json(
            &self.client,
            Method::POST,
            &format!("{api_base}/repos/{repo_path}/issues"),
            headers.clone(),
            &[],
            Some(&body),
        )
        .await?;

        if issue.state.is_closed() {
            if let Some(number) = created.get("number") {
                let url = format!("{api_base}/repos/{repo_path}/issues/{number}");
                let _ = http::request_json(
                    &self.client,
                    Method::PATCH,
                    &url,
                    headers,
                    &[],
                    Some(&json!({ "state": "closed" })),
                )
                .await;
            }
        }

        Ok(())
    }

    async fn list_pull_requests(&self, ctx: &RepoContext) -> Result<Vec<NormalizedPullRequest>> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);
        let mut pulls = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!("{api_base}/repos/{repo_path}/pulls");
            let payload = http::request_json(
                &self.client,
                Method::GET,
                &url,
                headers.clone(),
                &[
                    ("state", "all".to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ],
                None,
            )
            .await?;

            let items = payload.as_array().cloned().unwrap_or_default();
            if items.is_empty() {
                break;
            }

            let page_len = items.len();
            pulls.extend(items.iter().map(normalize_pull_request));

            if page_len < PER_PAGE as usize {
                break;
            }
        }

        Ok(pulls)
    }

    async fn create_pull_request(&self, ctx: &RepoContext, pr: &NormalizedPullRequest) -> Result<()> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);

        let body = json!({
            "title": pr.title,
            "body": pr.description,
            "head": pr.source_branch,
            "base": pr.target_branch,
            "draft": pr.draft,
        });

        let created = http::request_json(
            &self.client,
            Method::POST,
            &format!("{api_base}/repos/{repo_path}/pulls"),
            headers.clone(),
            &[],
            Some(&body),
        )
        .await?;

        if pr.state.is_closed() {
            if let Some(number) = created.get("number") {
                let url = format!("{api_base}/repos/{repo_path}/pulls/{number}");
                let _ = http::request_json(
                    &self.client,
                    Method::PATCH,
                    &url,
                    headers,
                    &[],
                    Some(&json!({ "state": "closed" })),
                )
                .await;
            }
        }

        Ok(())
    }

    async fn list_usernames(&self, ctx: &RepoContext) -> Result<Vec<String>> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);
        let mut usernames: Vec<String> = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!("{api_base}/repos/{repo_path}/collaborators");
            let payload = http::request_json(
                &self.client,
                Method::GET,
                &url,
                headers.clone(),
                &[("per_page", PER_PAGE.to_string()), ("page", page.to_string())],
                None,
            )
            .await?;

            let items = payload.as_array().cloned().unwrap_or_default();
            if items.is_empty() {
                break;
            }

            let page_len = items.len();
            for item in &items {
                if let Some(login) = item.get("login").and_then(Value::as_str) {
                    usernames.push(login.to_string());
                }
            }

            if page_len < PER_PAGE as usize {
                break;
            }
        }

        usernames.sort();
        usernames.dedup();
        Ok(usernames)
    }

    async fn user_exists(&self, ctx: &RepoContext, username: &str) -> Result<bool> {
        let api_base = ctx.api_base()?;
        let headers = self.headers(&ctx.token);
        let url = format!("{api_base}/users/{}", urlencoding::encode(username));
        http::request_found(&self.client, &url, headers).await
    }
}

fn normalize_issue(item: &Value) -> NormalizedIssue {
    let labels = item
        .get("labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(|label| label.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    NormalizedIssue {
        title: item
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(NormalizedIssue::UNTITLED)
            .to_string(),
        description: item
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        state: if item.get("state").and_then(Value::as_str) == Some("closed") {
            ItemState::Closed
        } else {
            ItemState::Open
        },
        labels,
    }
}

fn normalize_pull_request(item: &Value) -> NormalizedPullRequest {
    NormalizedPullRequest {
        title: item
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(NormalizedPullRequest::UNTITLED)
            .to_string(),
        description: item
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        source_branch: item
            .pointer("/head/ref")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        target_branch: item
            .pointer("/base/ref")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        state: if item.get("state").and_then(Value::as_str) == Some("closed") {
            ItemState::Closed
        } else {
            ItemState::Open
        },
        draft: item.get("draft").and_then(Value::as_bool).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_issue_skips_unlabeled_entries_and_keeps_names() {
        let item = json!({
            "title": "Bug",
            "body": "oops",
            "state": "open",
            "labels": [{"name": "bug"}, {"color": "red"}],
        });
        let issue = normalize_issue(&item);
        assert_eq!(issue.labels, vec!["bug".to_string()]);
    }

    #[test]
    fn normalize_issue_falls_back_to_untitled() {
        let item = json!({ "body": null, "state": "open" });
        let issue = normalize_issue(&item);
        assert_eq!(issue.title, NormalizedIssue::UNTITLED);
        assert_eq!(issue.description, "");
    }

    #[test]
    fn normalize_pull_request_reads_nested_branch_refs() {
        let item = json!({
            "title": "Add feature",
            "body": "details",
            "head": {"ref": "feature/x"},
            "base": {"ref": "main"},
            "state": "closed",
            "draft": true,
        });
        let pr = normalize_pull_request(&item);
        assert_eq!(pr.source_branch, "feature/x");
        assert_eq!(pr.target_branch, "main");
        assert!(pr.state.is_closed());
        assert!(pr.draft);
    }
}
