use crate::github::API_BASE_URL;
use crate::models::{IssuesFilter, PageStep};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "repo-issues")]
#[command(about = "Browse a GitHub repository's issues with state filtering and pagination")]
#[command(version)]
pub struct Cli {
    /// Repository as owner/name, or percent-encoded as owner%2Fname
    pub repository: String,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = API_BASE_URL)]
    pub api_url: String,

    /// Token sent as `Authorization: token ...`
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Initial issue state: all, open or closed
    #[arg(long, default_value = "open")]
    pub filter: IssuesFilter,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REPO_ISSUES_TIMEOUT", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "REPO_ISSUES_LOG", default_value = "warn")]
    pub log_level: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print the first page and exit
    #[arg(long)]
    pub once: bool,
}

/// A line typed at the interactive prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Filter(IssuesFilter),
    Page(PageStep),
    Reload,
    Back,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let mut words = line.split_whitespace();
        let head = words.next()?.to_ascii_lowercase();

        let command = match head.as_str() {
            "n" | "next" | ">" => Command::Page(PageStep::Next),
            "p" | "prev" | "previous" | "<" => Command::Page(PageStep::Previous),
            "r" | "reload" => Command::Reload,
            "b" | "back" | "q" | "quit" => Command::Back,
            "h" | "help" | "?" => Command::Help,
            "f" | "filter" => Command::Filter(words.next()?.parse().ok()?),
            other => Command::Filter(other.parse().ok()?),
        };

        Some(command)
    }
}

pub const HELP: &str = "\
commands:
  all | open | closed   select issue state (also: f <state>)
  n, >                  next page
  p, <                  previous page
  r                     reload
  b, q                  back to repositories (quit)";
