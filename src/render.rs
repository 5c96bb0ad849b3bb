use crate::error::ErrorKind;
use crate::models::{IssuesFilter, LoadState, PageStep, ViewState};
use crate::types::{Issue, RepositorySummary};
use colored::*;
use std::fmt::{self, Formatter};

pub const BACK_LINK: &str = "Back to repositories";
pub const LOADING: &str = "Loading";

/// Render the whole view as terminal text.
pub fn render_view(view: &ViewState) -> String {
    RenderedView(view).to_string()
}

/// Display adapter over a view snapshot.
pub struct RenderedView<'a>(pub &'a ViewState);

impl fmt::Display for RenderedView<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let view = self.0;

        // nothing but the indicator until the first fetch pair lands
        if view.load == LoadState::Loading && view.repository.is_none() {
            return writeln!(f, "{}", LOADING.bold());
        }

        writeln!(f, "{}", format!("← {}", BACK_LINK).cyan())?;

        match &view.repository {
            Some(repository) => render_owner(f, repository)?,
            None => writeln!(f, "\n{}", view.repo.full_name().bold())?,
        }

        writeln!(f)?;
        render_filter_and_pagination(f, view)?;
        writeln!(f)?;

        match &view.load {
            LoadState::Failed(err) => {
                let title = match err.kind {
                    ErrorKind::Network => "Could not reach GitHub",
                    ErrorKind::NotFound => "Repository not found",
                    ErrorKind::RateLimited => "GitHub rate limit exceeded",
                    ErrorKind::InvalidRepository => "Invalid repository",
                    ErrorKind::Api | ErrorKind::Other => "Could not load issues",
                };
                writeln!(f, "{}", title.red().bold())?;
                writeln!(f, "{}", err.message.red())?;
                writeln!(f, "{}", "Select a filter or press r to try again.".dimmed())
            }
            LoadState::Loading | LoadState::Ready | LoadState::Refreshing => {
                if view.load == LoadState::Refreshing {
                    writeln!(f, "{}", format!("{}…", LOADING).dimmed())?;
                }
                render_issue_list(f, &view.issues)
            }
        }
    }
}

fn render_owner(f: &mut Formatter<'_>, repository: &RepositorySummary) -> fmt::Result {
    writeln!(
        f,
        "\n{} {}",
        repository.owner.login.bold(),
        format!("<{}>", repository.owner.avatar_url).dimmed()
    )?;
    writeln!(f, "{}", repository.name.bold().green())?;
    if let Some(description) = repository.description.as_deref().filter(|d| !d.is_empty()) {
        writeln!(f, "{}", description)?;
    }
    Ok(())
}

fn render_filter_and_pagination(f: &mut Formatter<'_>, view: &ViewState) -> fmt::Result {
    let options: Vec<String> = IssuesFilter::ALL
        .iter()
        .map(|filter| {
            if *filter == view.issues_filter {
                format!("[{}]", filter.label()).bold().to_string()
            } else {
                format!(" {} ", filter.label())
            }
        })
        .collect();

    writeln!(
        f,
        "{}   {} {} {}",
        options.join(" "),
        page_button("<", view.can_step(PageStep::Previous)),
        format!("page {}", view.current_page).dimmed(),
        page_button(">", view.can_step(PageStep::Next)),
    )
}

fn page_button(symbol: &str, enabled: bool) -> ColoredString {
    if enabled {
        format!("({})", symbol).bold()
    } else {
        format!("({})", symbol).dimmed().strikethrough()
    }
}

fn render_issue_list(f: &mut Formatter<'_>, issues: &[Issue]) -> fmt::Result {
    if issues.is_empty() {
        return writeln!(f, "{}", "No issues".dimmed());
    }

    for issue in issues {
        write!(f, "{} {}", format!("#{}", issue.number).dimmed(), issue.title.bold())?;
        for label in &issue.labels {
            write!(f, " {}", format!("[{}]", label.name).yellow())?;
        }
        writeln!(f)?;
        writeln!(f, "    {}  {}", issue.user.login, issue.html_url.dimmed())?;
    }
    Ok(())
}
