use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepoIssuesError {
    #[error("GitHub API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limit exceeded{}", reset_suffix(.reset_at))]
    RateLimitExceeded { reset_at: Option<DateTime<Utc>> },

    #[error("Invalid repository: {0}")]
    InvalidRepository(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),
}

fn reset_suffix(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(" (resets at {})", at.format("%H:%M:%S UTC")),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, RepoIssuesError>;

/// Coarse classification shown by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    NotFound,
    RateLimited,
    Api,
    InvalidRepository,
    Other,
}

/// Cloneable summary of a failed fetch, kept in view state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&RepoIssuesError> for ViewError {
    fn from(err: &RepoIssuesError) -> Self {
        let kind = match err {
            RepoIssuesError::NetworkError(_) => ErrorKind::Network,
            RepoIssuesError::NotFound(_) => ErrorKind::NotFound,
            RepoIssuesError::RateLimitExceeded { .. } => ErrorKind::RateLimited,
            RepoIssuesError::ApiError { .. } | RepoIssuesError::JsonError(_) => ErrorKind::Api,
            RepoIssuesError::InvalidRepository(_) => ErrorKind::InvalidRepository,
            RepoIssuesError::ConfigError(_) => ErrorKind::Other,
        };

        ViewError {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<RepoIssuesError> for ViewError {
    fn from(err: RepoIssuesError) -> Self {
        ViewError::from(&err)
    }
}
