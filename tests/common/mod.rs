#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use repo_issues::error::{RepoIssuesError, Result};
use repo_issues::github::{IssuesApi, IssuesPage, PageLinks};
use repo_issues::models::IssuesFilter;
use repo_issues::route::RepoId;
use repo_issues::types::{Issue, IssueUser, Label, Owner, RepositorySummary};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PER_PAGE: usize = 10;

/// Issue counts served by the mock for octocat/Hello-World.
pub fn issue_count(state: &str) -> usize {
    match state {
        "open" => 25,
        "closed" => 5,
        _ => 30,
    }
}

pub fn total_pages(count: usize) -> u32 {
    std::cmp::max(1, count.div_ceil(PER_PAGE)) as u32
}

/// A local stand-in for the GitHub REST API.
#[derive(Clone, Default)]
pub struct MockGitHub {
    pub requests: Arc<Mutex<Vec<String>>>,
    pub authorization: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockGitHub {
    /// Serve on an ephemeral port, returning the base URL.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/repos/:owner/:name", get(repository))
            .route("/repos/:owner/:name/issues", get(issues))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        format!("http://{}", addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, uri: &Uri, headers: &HeaderMap) {
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        self.requests.lock().unwrap().push(target);
        self.authorization.lock().unwrap().push(
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        );
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })),
    )
        .into_response()
}

fn error_for(owner: &str) -> Option<Response> {
    match owner {
        "limited" => Some(
            (
                StatusCode::FORBIDDEN,
                [
                    ("X-RateLimit-Remaining", "0"),
                    ("X-RateLimit-Reset", "1700000000"),
                ],
                Json(json!({ "message": "API rate limit exceeded" })),
            )
                .into_response(),
        ),
        "broken" => Some(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Server Error" })),
            )
                .into_response(),
        ),
        "garbled" => Some(
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html")],
                "<html>not json</html>",
            )
                .into_response(),
        ),
        "octocat" => None,
        _ => Some(not_found()),
    }
}

async fn repository(
    State(mock): State<MockGitHub>,
    Path((owner, name)): Path<(String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    mock.record(&uri, &headers);
    if let Some(response) = error_for(&owner) {
        return response;
    }
    if name != "Hello-World" {
        return not_found();
    }

    Json(json!({
        "id": 1296269,
        "name": "Hello-World",
        "full_name": "octocat/Hello-World",
        "description": "This your first repo!",
        "html_url": "https://github.com/octocat/Hello-World",
        "private": false,
        "owner": {
            "login": "octocat",
            "id": 1,
            "avatar_url": "https://github.com/images/error/octocat_happy.gif"
        }
    }))
    .into_response()
}

#[derive(Deserialize)]
struct IssuesQuery {
    state: String,
    per_page: usize,
    page: u32,
}

async fn issues(
    State(mock): State<MockGitHub>,
    Path((owner, name)): Path<(String, String)>,
    Query(query): Query<IssuesQuery>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    mock.record(&uri, &headers);
    if let Some(response) = error_for(&owner) {
        return response;
    }
    if name != "Hello-World" {
        return not_found();
    }

    let count = issue_count(&query.state);
    let last = total_pages(count);
    let start = (query.page.saturating_sub(1) as usize) * query.per_page;
    let end = std::cmp::min(count, start + query.per_page);

    let body: Vec<serde_json::Value> = (start..end)
        .map(|i| {
            let number = i + 1;
            let labels = if number % 2 == 0 {
                json!([{ "id": 208045946, "name": "bug", "color": "f29513" }])
            } else {
                json!([])
            };
            json!({
                "id": 1000 + number,
                "number": number,
                "title": format!("{} issue {}", query.state, number),
                "html_url": format!("https://github.com/octocat/Hello-World/issues/{}", number),
                "state": if query.state == "closed" { "closed" } else { "open" },
                "user": {
                    "login": format!("user{}", number),
                    "avatar_url": format!("https://avatars.example.com/u/{}", number)
                },
                "labels": labels
            })
        })
        .collect();

    let link = link_header(&query.state, query.page, last);
    let mut response = Json(body).into_response();
    if !link.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&link) {
            response.headers_mut().insert(header::LINK, value);
        }
    }
    response
}

fn link_header(state: &str, page: u32, last: u32) -> String {
    let url = |p: u32| {
        format!(
            "<https://api.github.com/repositories/1296269/issues?state={}&per_page=10&page={}>",
            state, p
        )
    };

    let mut parts = Vec::new();
    if page > 1 {
        parts.push(format!("{}; rel=\"prev\"", url(page - 1)));
    }
    if page < last {
        parts.push(format!("{}; rel=\"next\"", url(page + 1)));
        parts.push(format!("{}; rel=\"last\"", url(last)));
    }
    if page > 1 {
        parts.push(format!("{}; rel=\"first\"", url(1)));
    }
    parts.join(", ")
}

/// One call made against [`FakeApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Repository(String),
    Issues {
        repo: String,
        filter: IssuesFilter,
        page: u32,
    },
}

/// In-process [`IssuesApi`] with scripted pagination, delays and failures.
#[derive(Default)]
pub struct FakeApi {
    pub calls: Mutex<Vec<ApiCall>>,
    /// pages available per filter, default 1
    pub pages: HashMap<IssuesFilter, u32>,
    pub delays: HashMap<(IssuesFilter, u32), Duration>,
    /// the next N issues reads fail
    pub failures: AtomicUsize,
}

impl FakeApi {
    pub fn with_pages(pages: &[(IssuesFilter, u32)]) -> Self {
        FakeApi {
            pages: pages.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn issue_calls(&self) -> Vec<(IssuesFilter, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Issues { filter, page, .. } => Some((filter, page)),
                ApiCall::Repository(_) => None,
            })
            .collect()
    }

    pub fn repository_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::Repository(_)))
            .count()
    }
}

impl IssuesApi for FakeApi {
    async fn get_repository(&self, repo: &RepoId) -> Result<RepositorySummary> {
        self.calls
            .lock()
            .unwrap()
            .push(ApiCall::Repository(repo.full_name()));

        if repo.owner == "missing" {
            return Err(RepoIssuesError::NotFound(format!("/repos/{}", repo)));
        }

        Ok(RepositorySummary {
            name: repo.name.clone(),
            full_name: repo.full_name(),
            description: Some("fake repository".to_string()),
            html_url: format!("https://github.com/{}", repo),
            owner: Owner {
                login: repo.owner.clone(),
                avatar_url: format!("https://avatars.example.com/{}", repo.owner),
            },
        })
    }

    async fn fetch_issues_page(
        &self,
        repo: &RepoId,
        filter: IssuesFilter,
        page: u32,
    ) -> Result<IssuesPage> {
        self.calls.lock().unwrap().push(ApiCall::Issues {
            repo: repo.full_name(),
            filter,
            page,
        });

        if let Some(delay) = self.delays.get(&(filter, page)) {
            tokio::time::sleep(*delay).await;
        }

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RepoIssuesError::ApiError {
                status: 502,
                message: "Bad Gateway".to_string(),
            });
        }

        let last = self.pages.get(&filter).copied().unwrap_or(1);
        Ok(IssuesPage {
            issues: vec![Issue {
                id: u64::from(page),
                number: u64::from(page),
                title: format!("{} page {}", filter, page),
                html_url: format!("https://github.com/{}/issues/{}", repo, page),
                state: filter.to_string(),
                user: IssueUser {
                    login: "hubot".to_string(),
                    avatar_url: "https://avatars.example.com/hubot".to_string(),
                },
                labels: vec![Label {
                    id: 1,
                    name: "triage".to_string(),
                }],
                pull_request: None,
            }],
            links: PageLinks {
                has_prev: page > 1,
                has_next: page < last,
            },
        })
    }
}
