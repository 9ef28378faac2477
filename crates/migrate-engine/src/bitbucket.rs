//! Bitbucket Cloud adapter.
//!
//! Bitbucket differs from GitHub/GitLab in two ways this module has to
//! absorb: pagination is cursor-based (`next` is a full URL, not a page
//! number), and it has no API for "does this username exist" — usernames
//! are instead gathered from every surface the repository exposes and
//! checked for membership.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::BTreeSet;

use migrate_types::{ItemState, NormalizedIssue, NormalizedPullRequest};

use crate::context::RepoContext;
use crate::error::Result;
use crate::http;
use crate::provider_adapter::ProviderAdapter;

const PAGE_LEN: u32 = 100;
const MAX_PAGES: u32 = 10;
const PR_STATES: &str = "OPEN,MERGED,DECLINED,SUPERSEDED";

pub struct BitbucketAdapter {
    client: reqwest::Client,
}

impl BitbucketAdapter {
    pub fn new() -> Self {
        Self {
            client: http::build_client(),
        }
    }

    fn headers(&self, token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = if token.contains(':') {
            format!("Basic {}", STANDARD.encode(token.as_bytes()))
        } else {
            format!("Bearer {token}")
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    /// Follows Bitbucket's `next` cursor until it runs dry or hits
    /// [`MAX_PAGES`], collecting every item in `values`.
    async fn paginated_get(
        &self,
        url: &str,
        headers: &HeaderMap,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next_url = Some(url.to_string());
        let mut query = query.to_vec();
        if !query.iter().any(|(k, _)| *k == "pagelen") {
            query.push(("pagelen", PAGE_LEN.to_string()));
        }

        let mut page = 0;
        while let Some(current_url) = next_url.take() {
            page += 1;
            if page > MAX_PAGES {
                break;
            }

            let query_for_call: &[(&str, String)] = if page == 1 { &query } else { &[] };
            let payload = http::request_json(
                &self.client,
                Method::GET,
                &current_url,
                headers.clone(),
                query_for_call,
                None,
            )
            .await?;

            if let Some(values) = payload.get("values").and_then(Value::as_array) {
                items.extend(values.iter().cloned());
            }
            next_url = payload.get("next").and_then(Value::as_str).map(str::to_string);
        }

        Ok(items)
    }
}

impl Default for BitbucketAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderAdapter for BitbucketAdapter {
    async fn list_issues(&self, ctx: &RepoContext) -> Result<Vec<NormalizedIssue>> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);
        let url = format!("{api_base}/repositories/{repo_path}/issues");
        let items = self
            .paginated_get(
                &url,
                &headers,
                &[(
                    "q",
                    r#"state="new" OR state="open" OR state="resolved" OR state="closed""#.to_string(),
                )],
            )
            .await?;
        Ok(items.iter().map(normalize_issue).collect())
    }

    async fn create_issue(&self, ctx: &RepoContext, issue: &NormalizedIssue) -> Result<()> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);

        let body = json!({
            "title": issue.title,
            "content": { "raw": issue.description },
        });

        let created = http::request_json(
            &self.client,
            Method::POST,
            &format!("{api_base}/repositories/{repo_path}/issues"),
            headers.clone(),
            &[],
            Some(&body),
        )
        .await?;

        if issue.state.is_closed() {
            if let Some(id) = created.get("id") {
                let url = format!("{api_base}/repositories/{repo_path}/issues/{id}");
                let _ = http::request_json(
                    &self.client,
                    Method::PUT,
                    &url,
                    headers,
                    &[],
                    Some(&json!({ "state": "resolved" })),
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
        let url = format!("{api_base}/repositories/{repo_path}/pullrequests");
        let items = self
            .paginated_get(&url, &headers, &[("state", PR_STATES.to_string())])
            .await?;
        Ok(items.iter().map(normalize_pull_request).collect())
    }

    async fn create_pull_request(&self, ctx: &RepoContext, pr: &NormalizedPullRequest) -> Result<()> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);

        let body = json!({
            "title": pr.title,
            "description": pr.description,
            "source": { "branch": { "name": pr.source_branch } },
            "destination": { "branch": { "name": pr.target_branch } },
        });

        let created = http::request_json(
            &self.client,
            Method::POST,
            &format!("{api_base}/repositories/{repo_path}/pullrequests"),
            headers.clone(),
            &[],
            Some(&body),
        )
        .await?;

        if pr.state.is_closed() {
            if let Some(id) = created.get("id") {
                let url = format!("{api_base}/repositories/{repo_path}/pullrequests/{id}/decline");
                let _ = http::request_status(&self.client, Method::POST, &url, headers, None).await;
            }
        }

        Ok(())
    }

    async fn list_usernames(&self, ctx: &RepoContext) -> Result<Vec<String>> {
        let api_base = ctx.api_base()?;
        let repo_path = ctx.repo_path()?;
        let headers = self.headers(&ctx.token);
        let mut users: BTreeSet<String> = BTreeSet::new();

        if let Ok(items) = self
            .paginated_get(&format!("{api_base}/repositories/{repo_path}/default-reviewers"), &headers, &[])
            .await
        {
            collect_usernames(&items, None, &mut users);
        }

        if let Ok(items) = self
            .paginated_get(&format!("{api_base}/repositories/{repo_path}/watchers"), &headers, &[])
            .await
        {
            collect_usernames(&items, None, &mut users);
        }

        if let Ok(items) = self
            .paginated_get(&format!("{api_base}/repositories/{repo_path}/issues"), &headers, &[])
            .await
        {
            for item in &items {
                for key in ["reporter", "assignee"] {
                    if let Some(user) = item.get(key) {
                        if let Some(username) = extract_username(user) {
                            users.insert(username);
                        }
                    }
                }
            }
        }

        if let Ok(items) = self
            .paginated_get(
                &format!("{api_base}/repositories/{repo_path}/pullrequests"),
                &headers,
                &[("state", PR_STATES.to_string())],
            )
            .await
        {
            collect_usernames(&items, Some("author"), &mut users);
        }

        Ok(users.into_iter().collect())
    }

    async fn user_exists(&self, ctx: &RepoContext, username: &str) -> Result<bool> {
        let usernames = self.list_usernames(ctx).await?;
        Ok(usernames.iter().any(|candidate| candidate == username))
    }
}

fn collect_usernames(items: &[Value], wrapped_user_key: Option<&str>, out: &mut BTreeSet<String>) {
    for item in items {
        let user = match wrapped_user_key {
            Some(key) => item.get(key),
            None => Some(item),
        };
        if let Some(user) = user {
            if let Some(username) = extract_username(user) {
                out.insert(username);
            }
        }
    }
}

fn extract_username(user: &Value) -> Option<String> {
    user.get("username")
        .or_else(|| user.get("nickname"))
        .or_else(|| user.get("display_name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn normalize_issue(item: &Value) -> NormalizedIssue {
    let state = item.get("state").and_then(Value::as_str).unwrap_or("");
    NormalizedIssue {
        title: item
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(NormalizedIssue::UNTITLED)
            .to_string(),
        description: item
            .pointer("/content/raw")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        state: if matches!(state, "resolved" | "closed") {
            ItemState::Closed
        } else {
            ItemState::Open
        },
        labels: Vec::new(),
    }
}

fn normalize_pull_request(item: &Value) -> NormalizedPullRequest {
    let state = item.get("state").and_then(Value::as_str).unwrap_or("OPEN");
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
            .pointer("/source/branch/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        target_branch: item
            .pointer("/destination/branch/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        state: if matches!(state, "DECLINED" | "SUPERSEDED") {
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
    fn normalize_issue_treats_resolved_and_closed_as_closed() {
        let resolved = json!({ "title": "t", "content": {"raw": "d"}, "state": "resolved" });
        let closed = json!({ "title": "t", "content": {"raw": "d"}, "state": "closed" });
        let open = json!({ "title": "t", "content": {"raw": "d"}, "state": "new" });
        assert!(normalize_issue(&resolved).state.is_closed());
        assert!(normalize_issue(&closed).state.is_closed());
        assert!(!normalize_issue(&open).state.is_closed());
    }

    #[test]
    fn normalize_pull_request_treats_declined_and_superseded_as_closed() {
        let declined = json!({
            "title": "t", "description": "d",
            "source": {"branch": {"name": "feat"}},
            "destination": {"branch": {"name": "main"}},
            "state": "DECLINED",
        });
        assert!(normalize_pull_request(&declined).state.is_closed());
    }

    #[test]
    fn extract_username_prefers_username_over_nickname() {
        let user = json!({ "username": "alice", "nickname": "al" });
        assert_eq!(extract_username(&user).as_deref(), Some("alice"));
    }

    #[test]
    fn extract_username_falls_back_through_display_name() {
        let user = json!({ "display_name": "Alice A." });
        assert_eq!(extract_username(&user).as_deref(), Some("Alice A."));
    }
}
