//! GitLab adapter.

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

pub struct GitLabAdapter {
    client: reqwest::Client,
}

impl GitLabAdapter {
    pub fn new() -> Self {
        Self {
            client: http::build_client(),
        }
    }

    fn headers(&self, token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(token) {
            headers.insert(HeaderName::from_static("private-token"), value);
        }
        headers
    }
}

impl Default for GitLabAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for GitLabAdapter {
    async fn list_issues(&self, ctx: &RepoContext) -> Result<Vec<NormalizedIssue>> {
        let api_base = ctx.api_base()?;
        let project_id = ctx.gitlab_project_id()?;
        let headers = self.headers(&ctx.token);
        let mut issues = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!("{api_base}/projects/{project_id}/issues");
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
            issues.extend(items.iter().map(normalize_issue));

            if page_len < PER_PAGE as usize {
                break;
            }
        }

        Ok(issues)
    }

    async fn create_issue(&self, ctx: &RepoContext, issue: &NormalizedIssue) -> Result<()> {
        let api_base = ctx.api_base()?;
        let project_id = ctx.gitlab_project_id()?;
        let headers = self.headers(&ctx.token);

        let body = json!({
            "title": issue.title,
            "description": issue.description,
            "labels": issue.labels.join(","),
        });

        let created = http::request_json(
            &self.client,
            Method::POST,
            &format!("{api_base}/projects/{project_id}/issues"),
            headers.clone(),
            &[],
            Some(&body),
        )
        .await?;

        if issue.state.is_closed() {
            if let Some(iid) = created.get("iid") {
                let url = format!("{api_base}/projects/{project_id}/issues/{iid}");
                let _ = http::request_json(
                    &self.client,
                    Method::PUT,
                    &url,
                    headers,
                    &[],
                    Some(&json!({ "state_event": "close" })),
                )
                .await;
            }
        }

        Ok(())
    }

    async fn list_pull_requests(&self, ctx: &RepoContext) -> Result<Vec<NormalizedPullRequest>> {
        let api_base = ctx.api_base()?;
        let project_id = ctx.gitlab_project_id()?;
        let headers = self.headers(&ctx.token);
        let mut merge_requests = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!("{api_base}/projects/{project_id}/merge_requests");
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
            merge_requests.extend(items.iter().map(normalize_pull_request));

            if page_len < PER_PAGE as usize {
                break;
            }
        }

        Ok(merge_requests)
    }

    async fn create_pull_request(&self, ctx: &RepoContext, pr: &NormalizedPullRequest) -> Result<()> {
        let api_base = ctx.api_base()?;
        let project_id = ctx.gitlab_project_id()?;
        let headers = self.headers(&ctx.token);

        let body = json!({
            "title": pr.title,
            "description": pr.description,
            "source_branch": pr.source_branch,
            "target_branch": pr.target_branch,
        });

        let created = http::request_json(
            &self.client,
            Method::POST,
            &format!("{api_base}/projects/{project_id}/merge_requests"),
            headers.clone(),
            &[],
            Some(&body),
        )
        .await?;

        if pr.state.is_closed() {
            if let Some(iid) = created.get("iid") {
                let url = format!("{api_base}/projects/{project_id}/merge_requests/{iid}");
                let _ = http::request_json(
                    &self.client,
                    Method::PUT,
                    &url,
                    headers,
                    &[],
                    Some(&json!({ "state_event": "close" })),
                )
                .await;
            }
        }

        Ok(())
    }

    async fn list_usernames(&self, ctx: &RepoContext) -> Result<Vec<String>> {
        let api_base = ctx.api_base()?;
        let project_id = ctx.gitlab_project_id()?;
        let headers = self.headers(&ctx.token);
        let mut usernames: Vec<String> = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!("{api_base}/projects/{project_id}/members/all");
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
                if let Some(username) = item.get("username").and_then(Value::as_str) {
                    usernames.push(username.to_string());
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
        let payload = http::request_json(
            &self.client,
            Method::GET,
            &format!("{api_base}/users"),
            headers,
            &[("username", username.to_string()), ("per_page", "1".to_string())],
            None,
        )
        .await?;

        Ok(payload.as_array().map(|items| !items.is_empty()).unwrap_or(false))
    }
}

fn normalize_issue(item: &Value) -> NormalizedIssue {
    let labels = item
        .get("labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let state = item.get("state").and_then(Value::as_str).unwrap_or("opened");

    NormalizedIssue {
        title: item
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(NormalizedIssue::UNTITLED)
            .to_string(),
        description: item
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        state: if state == "opened" {
            ItemState::Open
        } else if state == "closed" {
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
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        source_branch: item
            .get("source_branch")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        target_branch: item
            .get("target_branch")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        state: if item.get("state").and_then(Value::as_str) == Some("closed") {
            ItemState::Closed
        } else {
            ItemState::Open
        },
        draft: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_issue_maps_opened_to_open() {
        let item = json!({ "title": "t", "description": "d", "state": "opened", "labels": [] });
        let issue = normalize_issue(&item);
        assert_eq!(issue.state, ItemState::Open);
    }

    #[test]
    fn normalize_issue_keeps_closed() {
        let item = json!({ "title": "t", "description": "d", "state": "closed", "labels": [] });
        let issue = normalize_issue(&item);
        assert_eq!(issue.state, ItemState::Closed);
    }

    #[test]
    fn normalize_pull_request_only_closed_is_closed() {
        let item = json!({
            "title": "t", "description": "d",
            "source_branch": "feat", "target_branch": "main",
            "state": "merged",
        });
        let pr = normalize_pull_request(&item);
        assert_eq!(pr.state, ItemState::Open);
    }
}
