//! GitHub API client
//!
//! Thin REST client used by the tool handlers. One request per call, no
//! internal retries: failures surface to the dispatcher as they happen.

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde_json::Value;

use crate::config::{github, Config};
use crate::error::{GithubApiError, GithubMcpError, Result};
use crate::github::types::with_decoded_content;

/// GitHub API client
pub struct GithubClient {
    /// HTTP client
    http_client: reqwest::Client,

    /// API base URL without trailing slash
    base_url: String,

    /// User-Agent header value
    user_agent: String,
}

impl GithubClient {
    /// Create a new GitHub client
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }

    /// Create a client from runtime configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base_url.clone(), config.user_agent.clone())
    }

    /// List public repositories for a user
    pub async fn list_repos(&self, owner: &str, token: &str) -> Result<Value> {
        let url = format!("{}/users/{}/repos", self.base_url, encode_segment("owner", owner)?);
        self.get_json(&url, token, &format!("user {}", owner)).await
    }

    /// Read a file (or directory listing) from a repository
    pub async fn read_file(&self, owner: &str, repo: &str, path: &str, token: &str) -> Result<Value> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url,
            encode_segment("owner", owner)?,
            encode_segment("repo", repo)?,
            encode_path(path)?
        );
        let payload = self
            .get_json(&url, token, &format!("{}/{}:{}", owner, repo, path))
            .await?;
        Ok(with_decoded_content(payload))
    }

    async fn get_json(&self, url: &str, token: &str, resource: &str) -> Result<Value> {
        let response = self
            .http_client
            .get(url)
            .header(AUTHORIZATION, format!("token {}", token))
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, github::ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let text = response.text().await?;
            serde_json::from_str(&text).map_err(|e| {
                GithubMcpError::Github(GithubApiError::MalformedResponse {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            })
        } else if status.as_u16() == 404 {
            Err(GithubMcpError::Github(GithubApiError::NotFound {
                resource: resource.to_string(),
            }))
        } else {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "GitHub request failed");
            Err(GithubMcpError::Github(GithubApiError::RequestFailed {
                status: status.as_u16(),
                message: text,
            }))
        }
    }
}

/// Percent-encode one URL segment. Dot segments would be collapsed by the
/// URL parser and move the request off its endpoint, so they are refused.
fn encode_segment(field: &'static str, segment: &str) -> Result<String> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(GithubApiError::InvalidSegment {
            field,
            segment: segment.to_string(),
        }
        .into());
    }
    Ok(urlencoding::encode(segment).into_owned())
}

/// Percent-encode each path segment, keeping the separators.
/// An empty path addresses the repository root.
fn encode_path(path: &str) -> Result<String> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        return Ok(String::new());
    }
    let segments = path
        .split('/')
        .map(|segment| encode_segment("path", segment))
        .collect::<Result<Vec<_>>>()?;
    Ok(segments.join("/"))
}
