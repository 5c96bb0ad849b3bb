use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use repo_issues::actors::{RepositoryView, RepositoryViewMessage};
use repo_issues::cli::{Cli, Command, HELP};
use repo_issues::config::AppConfig;
use repo_issues::github::GitHubClient;
use repo_issues::models::{LoadState, ViewState};
use repo_issues::render::render_view;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;

    // Logs go to stderr so the rendered view owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level))
        )
        .with_writer(std::io::stderr)
        .init();

    if !config.color {
        colored::control::set_override(false);
    }

    let client = GitHubClient::new(&config.api_url, config.token.clone(), config.timeout)
        .context("Failed to create GitHub client")?;

    info!(repo = %config.repo, api_url = %config.api_url, "Opening repository view");

    let (view, handle, mut updates) =
        RepositoryView::spawn(Arc::new(client), config.repo.clone(), config.initial_filter)
            .await
            .context("Failed to start repository view")?;

    let outcome = if config.once {
        print_first_result(&mut updates).await
    } else {
        interactive(&view, &mut updates).await
    };

    view.stop(None);
    handle.await.ok();

    outcome
}

/// Wait for the first fetch pair, print it, and fail if it failed.
async fn print_first_result(updates: &mut watch::Receiver<ViewState>) -> Result<()> {
    let state = updates
        .wait_for(|state| matches!(state.load, LoadState::Ready | LoadState::Failed(_)))
        .await
        .context("Repository view stopped unexpectedly")?
        .clone();

    print!("{}", render_view(&state));

    match state.load {
        LoadState::Failed(err) => Err(anyhow::anyhow!(err.message)),
        _ => Ok(()),
    }
}

async fn interactive(
    view: &ractor::ActorRef<RepositoryViewMessage>,
    updates: &mut watch::Receiver<ViewState>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    redraw(&updates.borrow_and_update());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                redraw(&updates.borrow_and_update());
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                let message = match Command::parse(&line) {
                    Some(Command::Filter(filter)) => RepositoryViewMessage::SelectFilter(filter),
                    Some(Command::Page(step)) => RepositoryViewMessage::StepPage(step),
                    Some(Command::Reload) => RepositoryViewMessage::Reload,
                    Some(Command::Back) => break,
                    Some(Command::Help) => {
                        println!("{}", HELP);
                        continue;
                    }
                    None => {
                        if !line.trim().is_empty() {
                            println!("{} {}", "unknown command:".yellow(), line.trim());
                        }
                        continue;
                    }
                };
                debug!(?message, "Sending command to view");
                view.send_message(message)
                    .map_err(|e| anyhow::anyhow!("Repository view is gone: {}", e))?;
            }
            _ = &mut shutdown => {
                break;
            }
        }
    }

    Ok(())
}

fn redraw(state: &ViewState) {
    println!("{}", "=".repeat(50).dimmed());
    print!("{}", render_view(state));
    println!("{}", "(h for help)".dimmed());
}
