//! Thin REST helper shared by the three provider adapters.
//!
//! Mirrors one call shape: build a request, send it, and turn a >=400
//! response into a [`MigrationError::ProviderApiError`] carrying a short,
//! newline-squashed body snippet rather than the full response.

use reqwest::{header::HeaderMap, Method};
use serde_json::Value;
use std::time::Duration;

use crate::error::{MigrationError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SNIPPET_LEN: usize = 400;

/// Builds the single [`reqwest::Client`] every adapter shares.
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("reqwest client with static config always builds")
}

/// Issues a request and decodes the body as JSON, treating an empty body as
/// `{}` the way the reference service does.
pub async fn request_json(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    headers: HeaderMap,
    query: &[(&str, String)],
    body: Option<&Value>,
) -> Result<Value> {
    let method_name = method.to_string();
    let response = send(client, method, url, headers, query, body).await?;
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.as_u16() >= 400 {
        return Err(api_error(&method_name, url, status.as_u16(), &bytes));
    }

    if bytes.is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    Ok(serde_json::from_slice(&bytes)?)
}

/// Issues a request without decoding the body, returning only whether it
/// succeeded. Used for fire-and-forget calls like Bitbucket's PR decline.
pub async fn request_status(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    headers: HeaderMap,
    body: Option<&Value>,
) -> Result<()> {
    let method_name = method.to_string();
    let response = send(client, method, url, headers, &[], body).await?;
    let status = response.status();
    if status.as_u16() >= 400 {
        let bytes = response.bytes().await.unwrap_or_default();
        return Err(api_error(&method_name, url, status.as_u16(), &bytes));
    }
    Ok(())
}

/// Issues a request and reports only whether the server answered 200, used
/// by GitHub's user-existence probe.
pub async fn request_found(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
) -> Result<bool> {
    let response = send(client, Method::GET, url, headers, &[], None).await?;
    Ok(response.status().as_u16() == 200)
}

async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    headers: HeaderMap,
    query: &[(&str, String)],
    body: Option<&Value>,
) -> Result<reqwest::Response> {
    let mut builder = client.request(method.clone(), url).headers(headers);
    if !query.is_empty() {
        builder = builder.query(query);
    }
    if let Some(body) = body {
        builder = builder.json(body);
    }
    Ok(builder.send().await?)
}

fn api_error(method: &str, url: &str, status: u16, bytes: &[u8]) -> MigrationError {
    let truncated = &bytes[..bytes.len().min(SNIPPET_LEN)];
    let snippet = String::from_utf8_lossy(truncated).replace('\n', " ");
    MigrationError::ProviderApiError {
        method: method.to_string(),
        url: url.to_string(),
        status,
        snippet,
    }
}
