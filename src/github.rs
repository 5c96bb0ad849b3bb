use crate::error::{RepoIssuesError, Result};
use crate::models::IssuesFilter;
use crate::route::RepoId;
use crate::types::{Issue, RepositorySummary};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const API_BASE_URL: &str = "https://api.github.com";
pub const PER_PAGE: u32 = 10;

/// Which adjacent pages the `Link` header advertises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageLinks {
    pub fn from_header(link: Option<&str>) -> Self {
        let link = link.unwrap_or_default();
        PageLinks {
            has_prev: link.contains(r#"rel="prev""#),
            has_next: link.contains(r#"rel="next""#),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_header(headers.get(LINK).and_then(|h| h.to_str().ok()))
    }
}

/// One page of issues plus its pagination relations.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuesPage {
    pub issues: Vec<Issue>,
    pub links: PageLinks,
}

/// The two reads the repository view depends on.
pub trait IssuesApi: Send + Sync + 'static {
    fn get_repository(
        &self,
        repo: &RepoId,
    ) -> impl Future<Output = Result<RepositorySummary>> + Send;

    fn fetch_issues_page(
        &self,
        repo: &RepoId,
        filter: IssuesFilter,
        page: u32,
    ) -> impl Future<Output = Result<IssuesPage>> + Send;
}

pub struct GitHubClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RepoIssuesError::ConfigError(format!("invalid API URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RepoIssuesError::ConfigError(format!(
                "API URL cannot be used as a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("repo-issues/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(GitHubClient {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/repos/{owner}/{name}` followed by `extra` path segments.
    pub fn repo_url(&self, repo: &RepoId, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repos", repo.owner.as_str(), repo.name.as_str()])
                .extend(extra);
        }
        url
    }

    pub fn issues_url(&self, repo: &RepoId, filter: IssuesFilter, page: u32) -> Url {
        let mut url = self.repo_url(repo, &["issues"]);
        url.query_pairs_mut()
            .append_pair("state", filter.as_str())
            .append_pair("per_page", &PER_PAGE.to_string())
            .append_pair("page", &page.to_string());
        url
    }

    async fn make_request(&self, url: Url) -> Result<Response> {
        debug!(%url, "GET");

        let mut request = self
            .client
            .get(url.clone())
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let rate_limit = RateLimitHeaders::from_headers(response.headers());
        match status {
            StatusCode::NOT_FOUND => Err(RepoIssuesError::NotFound(url.path().to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!(%url, "rate limited");
                Err(RepoIssuesError::RateLimitExceeded {
                    reset_at: rate_limit.reset_at,
                })
            }
            StatusCode::FORBIDDEN if rate_limit.remaining == Some(0) => {
                warn!(%url, reset_at = ?rate_limit.reset_at, "rate limit exhausted");
                Err(RepoIssuesError::RateLimitExceeded {
                    reset_at: rate_limit.reset_at,
                })
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(RepoIssuesError::ApiError {
                    status: status.as_u16(),
                    message: api_message(&error_text),
                })
            }
        }
    }
}

impl IssuesApi for GitHubClient {
    async fn get_repository(&self, repo: &RepoId) -> Result<RepositorySummary> {
        let response = self.make_request(self.repo_url(repo, &[])).await?;
        let summary: RepositorySummary = decode_body(response).await?;
        Ok(summary)
    }

    async fn fetch_issues_page(
        &self,
        repo: &RepoId,
        filter: IssuesFilter,
        page: u32,
    ) -> Result<IssuesPage> {
        let response = self.make_request(self.issues_url(repo, filter, page)).await?;
        let links = PageLinks::from_headers(response.headers());
        let issues: Vec<Issue> = decode_body(response).await?;

        debug!(
            repo = %repo,
            filter = filter.as_str(),
            page,
            count = issues.len(),
            has_prev = links.has_prev,
            has_next = links.has_next,
            "Fetched issues page"
        );

        Ok(IssuesPage { issues, links })
    }
}

#[derive(Debug, Default)]
struct RateLimitHeaders {
    remaining: Option<u32>,
    reset_at: Option<DateTime<Utc>>,
}

impl RateLimitHeaders {
    fn from_headers(headers: &HeaderMap) -> Self {
        let remaining = headers
            .get("X-RateLimit-Remaining")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok());

        let reset_at = headers
            .get("X-RateLimit-Reset")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0));

        RateLimitHeaders {
            remaining,
            reset_at,
        }
    }
}

/// Read the whole body first so transport and decode failures stay distinct.
async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// GitHub error bodies look like `{"message": "...", "documentation_url": "..."}`.
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
