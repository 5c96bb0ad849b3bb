use crate::error::{Result, ViewError};
use crate::github::IssuesApi;
use crate::models::{FetchOutcome, FetchTicket, IssuesFilter, PageStep, ViewState};
use crate::route::RepoId;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SpawnErr};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Actor owning one repository view: all view state, and the fetch effect
/// keyed on `(filter, page)`.
pub struct RepositoryView<A> {
    _api: PhantomData<fn() -> A>,
}

impl<A> RepositoryView<A> {
    pub fn new() -> Self {
        Self { _api: PhantomData }
    }
}

impl<A> Default for RepositoryView<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages the view can handle
#[derive(Debug)]
pub enum RepositoryViewMessage {
    /// User picked an issue state
    SelectFilter(IssuesFilter),
    /// User pressed "<" or ">"
    StepPage(PageStep),
    /// Re-run the fetch for the current filter and page
    Reload,
    /// A fetch task finished
    FetchCompleted {
        generation: u64,
        outcome: std::result::Result<FetchOutcome, ViewError>,
    },
    /// Copy of the current state
    GetSnapshot(RpcReplyPort<ViewState>),
}

pub struct RepositoryViewArgs<A> {
    pub api: Arc<A>,
    pub repo: RepoId,
    pub initial_filter: IssuesFilter,
    pub updates: watch::Sender<ViewState>,
}

pub struct RepositoryViewState<A> {
    api: Arc<A>,
    view: ViewState,
    updates: watch::Sender<ViewState>,
}

impl<A: IssuesApi> RepositoryView<A> {
    /// Spawn a view for `repo` and start its first fetch. The receiver sees
    /// every state change.
    pub async fn spawn(
        api: Arc<A>,
        repo: RepoId,
        initial_filter: IssuesFilter,
    ) -> std::result::Result<
        (
            ActorRef<RepositoryViewMessage>,
            JoinHandle<()>,
            watch::Receiver<ViewState>,
        ),
        SpawnErr,
    > {
        let (updates, receiver) =
            watch::channel(ViewState::with_filter(repo.clone(), initial_filter));
        let args = RepositoryViewArgs {
            api,
            repo,
            initial_filter,
            updates,
        };

        let (actor_ref, handle) = Actor::spawn(None, RepositoryView::<A>::new(), args).await?;
        Ok((actor_ref, handle, receiver))
    }

    /// Issue the fetch pair if the key changed since the last one.
    fn run_effect(myself: &ActorRef<RepositoryViewMessage>, state: &mut RepositoryViewState<A>) {
        let Some(ticket) = state.view.next_fetch() else {
            return;
        };

        info!(
            repo = %ticket.repo,
            filter = ticket.key.filter.as_str(),
            page = ticket.key.page,
            generation = ticket.generation,
            "Fetching repository and issues"
        );

        let api = state.api.clone();
        let myself = myself.clone();
        tokio::spawn(async move {
            let outcome = fetch_repository_and_issues(api.as_ref(), &ticket)
                .await
                .map_err(|e| {
                    warn!(repo = %ticket.repo, generation = ticket.generation, "Fetch failed: {}", e);
                    ViewError::from(&e)
                });

            // the view may already be gone
            if myself
                .send_message(RepositoryViewMessage::FetchCompleted {
                    generation: ticket.generation,
                    outcome,
                })
                .is_err()
            {
                debug!(generation = ticket.generation, "View stopped before fetch completed");
            }
        });
    }
}

/// Both reads run concurrently; the result is ready only once both are.
pub async fn fetch_repository_and_issues<A: IssuesApi>(
    api: &A,
    ticket: &FetchTicket,
) -> Result<FetchOutcome> {
    let (repository, page) = futures::try_join!(
        api.get_repository(&ticket.repo),
        api.fetch_issues_page(&ticket.repo, ticket.key.filter, ticket.key.page),
    )?;

    Ok(FetchOutcome { repository, page })
}

#[ractor::async_trait]
impl<A: IssuesApi> Actor for RepositoryView<A> {
    type Msg = RepositoryViewMessage;
    type State = RepositoryViewState<A>;
    type Arguments = RepositoryViewArgs<A>;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> std::result::Result<Self::State, ActorProcessingErr> {
        info!(repo = %args.repo, filter = args.initial_filter.as_str(), "Repository view starting");

        let mut state = RepositoryViewState {
            api: args.api,
            view: ViewState::with_filter(args.repo, args.initial_filter),
            updates: args.updates,
        };

        Self::run_effect(&myself, &mut state);
        state.updates.send_replace(state.view.clone());

        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        match message {
            RepositoryViewMessage::SelectFilter(filter) => {
                debug!(filter = filter.as_str(), "Filter selected");
                state.view.select_filter(filter);
                Self::run_effect(&myself, state);
            }
            RepositoryViewMessage::StepPage(step) => {
                if state.view.step_page(step) {
                    debug!(page = state.view.current_page, "Page changed");
                    Self::run_effect(&myself, state);
                } else {
                    debug!(?step, page = state.view.current_page, "Page control disabled");
                    return Ok(());
                }
            }
            RepositoryViewMessage::Reload => {
                state.view.reload();
                Self::run_effect(&myself, state);
            }
            RepositoryViewMessage::FetchCompleted {
                generation,
                outcome,
            } => {
                if !state.view.apply(generation, outcome) {
                    debug!(
                        generation,
                        current = state.view.generation(),
                        "Discarding stale fetch result"
                    );
                    return Ok(());
                }
            }
            RepositoryViewMessage::GetSnapshot(reply) => {
                if reply.send(state.view.clone()).is_err() {
                    debug!("Snapshot requester went away");
                }
                return Ok(());
            }
        }

        state.updates.send_replace(state.view.clone());
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        state.view.teardown();
        state.updates.send_replace(state.view.clone());
        info!(repo = %state.view.repo, "Repository view stopped");
        Ok(())
    }
}
