use crate::cli::Cli;
use crate::error::{RepoIssuesError, Result};
use crate::models::IssuesFilter;
use crate::route::RepoId;
use std::time::Duration;

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub repo: RepoId,
    pub api_url: String,
    pub token: Option<String>,
    pub initial_filter: IssuesFilter,
    pub timeout: Duration,
    pub log_level: String,
    pub color: bool,
    pub once: bool,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let repo = RepoId::from_route_param(&cli.repository)?;

        if cli.timeout_secs == 0 {
            return Err(RepoIssuesError::ConfigError(
                "timeout must be at least one second".to_string(),
            ));
        }

        let api_url = cli.api_url.trim().to_string();
        if api_url.is_empty() {
            return Err(RepoIssuesError::ConfigError("API URL is empty".to_string()));
        }

        Ok(AppConfig {
            repo,
            api_url,
            token: cli.token.filter(|t| !t.trim().is_empty()),
            initial_filter: cli.filter,
            timeout: Duration::from_secs(cli.timeout_secs),
            log_level: cli.log_level,
            color: !cli.no_color,
            once: cli.once,
        })
    }
}
