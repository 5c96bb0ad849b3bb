use crate::error::ViewError;
use crate::github::IssuesPage;
use crate::route::RepoId;
use crate::types::{Issue, RepositorySummary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Issue state selected in the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuesFilter {
    All,
    #[default]
    Open,
    Closed,
}

impl IssuesFilter {
    pub const ALL: [IssuesFilter; 3] = [IssuesFilter::All, IssuesFilter::Open, IssuesFilter::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssuesFilter::All => "all",
            IssuesFilter::Open => "open",
            IssuesFilter::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IssuesFilter::All => "All",
            IssuesFilter::Open => "Open",
            IssuesFilter::Closed => "Closed",
        }
    }
}

impl fmt::Display for IssuesFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssuesFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(IssuesFilter::All),
            "open" => Ok(IssuesFilter::Open),
            "closed" => Ok(IssuesFilter::Closed),
            other => Err(format!("unknown issue state {:?} (expected all, open or closed)", other)),
        }
    }
}

/// Pagination control, a step of -1 or +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    Previous,
    Next,
}

impl PageStep {
    pub fn delta(&self) -> i64 {
        match self {
            PageStep::Previous => -1,
            PageStep::Next => 1,
        }
    }
}

/// Per-fetch load state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// First fetch in flight, nothing to show yet
    Loading,
    Ready,
    /// A later fetch is in flight; the previous list stays visible
    Refreshing,
    Failed(ViewError),
}

/// The part of the state a fetch depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub filter: IssuesFilter,
    pub page: u32,
}

/// A fetch to run, tagged with the generation it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub repo: RepoId,
    pub key: FetchKey,
}

/// Joined result of the repository and issues reads.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub repository: RepositorySummary,
    pub page: IssuesPage,
}

/// All state owned by one repository view.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub repo: RepoId,
    pub issues_filter: IssuesFilter,
    pub current_page: u32,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub load: LoadState,
    pub repository: Option<RepositorySummary>,
    pub issues: Vec<Issue>,
    generation: u64,
    last_key: Option<FetchKey>,
    closed: bool,
}

impl ViewState {
    pub fn new(repo: RepoId) -> Self {
        Self::with_filter(repo, IssuesFilter::default())
    }

    pub fn with_filter(repo: RepoId, filter: IssuesFilter) -> Self {
        Self {
            repo,
            issues_filter: filter,
            current_page: 1,
            has_previous_page: false,
            has_next_page: false,
            load: LoadState::Loading,
            repository: None,
            issues: Vec::new(),
            generation: 0,
            last_key: None,
            closed: false,
        }
    }

    pub fn key(&self) -> FetchKey {
        FetchKey {
            filter: self.issues_filter,
            page: self.current_page,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.load, LoadState::Failed(_))
    }

    /// Select a filter: page goes back to 1 and both pagination flags clear
    /// until the next result lands. Re-selecting after a failure forces a
    /// re-fetch even if nothing changed.
    pub fn select_filter(&mut self, filter: IssuesFilter) {
        if self.is_failed() {
            self.last_key = None;
        } else if filter == self.issues_filter && self.current_page == 1 {
            // nothing would refetch, so the flags must stay as they are
            return;
        }
        self.issues_filter = filter;
        self.current_page = 1;
        self.has_previous_page = false;
        self.has_next_page = false;
    }

    pub fn can_step(&self, step: PageStep) -> bool {
        match step {
            PageStep::Previous => self.has_previous_page && self.current_page > 1,
            PageStep::Next => self.has_next_page,
        }
    }

    /// Move one page back or forward. Returns false if that control is disabled.
    pub fn step_page(&mut self, step: PageStep) -> bool {
        if !self.can_step(step) {
            return false;
        }
        let page = i64::from(self.current_page) + step.delta();
        match u32::try_from(page) {
            Ok(page) if page >= 1 => {
                self.current_page = page;
                true
            }
            _ => false,
        }
    }

    /// Forget the last issued key so the next call to [`ViewState::next_fetch`] re-runs it.
    pub fn reload(&mut self) {
        self.last_key = None;
    }

    /// Issue a fetch if the key changed since the last one.
    pub fn next_fetch(&mut self) -> Option<FetchTicket> {
        if self.closed {
            return None;
        }
        let key = self.key();
        if self.last_key == Some(key) {
            return None;
        }

        self.last_key = Some(key);
        self.generation += 1;
        self.load = if self.repository.is_some() {
            LoadState::Refreshing
        } else {
            LoadState::Loading
        };

        Some(FetchTicket {
            generation: self.generation,
            repo: self.repo.clone(),
            key,
        })
    }

    /// Apply a finished fetch. Results from an older generation, or arriving
    /// after teardown, are dropped and `false` is returned.
    pub fn apply(&mut self, generation: u64, outcome: Result<FetchOutcome, ViewError>) -> bool {
        if self.closed || generation != self.generation {
            return false;
        }

        match outcome {
            Ok(FetchOutcome { repository, page }) => {
                self.repository = Some(repository);
                self.issues = page.issues;
                self.has_previous_page = page.links.has_prev;
                self.has_next_page = page.links.has_next;
                self.load = LoadState::Ready;
            }
            Err(err) => {
                self.has_previous_page = false;
                self.has_next_page = false;
                self.load = LoadState::Failed(err);
            }
        }
        true
    }

    /// Invalidate any in-flight fetch for good.
    pub fn teardown(&mut self) {
        self.closed = true;
        self.generation += 1;
    }
}
