//! Directory-listing and raw-content access to the GitHub contents API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, instrument};

use gitdocx_shared::{CrawlConfig, GitDocxError, Result, TreeNode};

use crate::address::ListingTarget;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("GitDocx/", env!("CARGO_PKG_VERSION"));

/// Media type the contents API documents for v3 JSON responses.
const ACCEPT: &str = "application/vnd.github.v3+json";

// ---------------------------------------------------------------------------
// ContentSource
// ---------------------------------------------------------------------------

/// Where the walk gets listings and file bodies from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// List the entries of a directory (or the single entry a file path names).
    async fn list(&self, target: &ListingTarget) -> Result<Vec<TreeNode>>;

    /// Fetch a file's raw text.
    async fn fetch_text(&self, node: &TreeNode) -> Result<String>;
}

// ---------------------------------------------------------------------------
// GitHubClient
// ---------------------------------------------------------------------------

/// [`ContentSource`] backed by the GitHub REST contents API.
pub struct GitHubClient {
    client: Client,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client with the timeout and token from `config`.
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GitDocxError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: config.token.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, ACCEPT);
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
            None => request,
        }
    }
}

#[async_trait]
impl ContentSource for GitHubClient {
    #[instrument(skip_all, fields(url = %target.url))]
    async fn list(&self, target: &ListingTarget) -> Result<Vec<TreeNode>> {
        let mut request = self.client.get(target.url.clone());
        if let Some(reference) = target.ref_param() {
            request = request.query(&[("ref", reference)]);
        }

        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| GitDocxError::listing(format!("Network error while listing files: {e}")))?;

        let status = response.status();
        debug!(status = status.as_u16(), "listing response");

        if !status.is_success() {
            return Err(GitDocxError::listing(status_message(
                status,
                target.display_name(),
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GitDocxError::listing(format!("Failed to read folder contents: {e}")))?;

        decode_listing(body)
    }

    #[instrument(skip_all, fields(path = %node.path))]
    async fn fetch_text(&self, node: &TreeNode) -> Result<String> {
        let download_url = node
            .download_url
            .as_deref()
            .ok_or_else(|| GitDocxError::fetch(&node.name, "no download URL in listing"))?;

        let response = self
            .authorized(self.client.get(download_url))
            .send()
            .await
            .map_err(|e| GitDocxError::fetch(&node.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GitDocxError::fetch(&node.name, format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| GitDocxError::fetch(&node.name, format!("body read failed: {e}")))
    }
}

/// Human-readable cause for a failed listing.
fn status_message(status: StatusCode, folder: &str) -> String {
    match status {
        StatusCode::NOT_FOUND => format!("Repository or folder not found: {folder}"),
        StatusCode::FORBIDDEN => {
            "Access forbidden. Rate limit exceeded or private repo requires token.".to_string()
        }
        StatusCode::UNAUTHORIZED => {
            "Authentication failed. Please check your GitHub token.".to_string()
        }
        other => format!("HTTP {}", other.as_u16()),
    }
}

/// Turn a listing payload into nodes.
///
/// An array is a directory listing; an object with a `type` is a single node;
/// an object with only a `message` is an API error.
pub fn decode_listing(body: serde_json::Value) -> Result<Vec<TreeNode>> {
    match body {
        serde_json::Value::Array(_) => serde_json::from_value(body)
            .map_err(|e| GitDocxError::listing(format!("unexpected listing entry: {e}"))),
        serde_json::Value::Object(ref map) if !map.contains_key("type") => {
            let message = map
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unrecognized response");
            Err(GitDocxError::listing(format!("GitHub API Error: {message}")))
        }
        serde_json::Value::Object(_) => {
            let node: TreeNode = serde_json::from_value(body)
                .map_err(|e| GitDocxError::listing(format!("unexpected listing entry: {e}")))?;
            Ok(vec![node])
        }
        other => Err(GitDocxError::listing(format!(
            "unexpected listing payload: {other}"
        ))),
    }
}
