use crate::accumulate::{IssueTree, Merge, Merged};
use crate::path::{PathError, RepoPath};
use crate::queries::{GetIssuesPage, QueryLimits, StarAction, ToggleStar};
use crate::types::{Organization, Repository};
use gqlient::{
    Cursor, Envelope, GqlError, Id, Interpreted, Operation, QueryPayload, TransportError,
};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Sequence number stamped on every request a [`Session`] issues.  Later
/// requests have higher generations.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Generation(u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request built by a [`Session`] that the caller must send and then report
/// back via [`Session::complete()`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ticket {
    pub generation: Generation,
    pub payload: QueryPayload,
}

/// The presentation-facing state of a [`Session`]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Status {
    /// No path has been loaded yet
    Idle,
    /// A fetch of issues is outstanding
    Loading,
    /// The most recent fetch of issues has completed
    Loaded,
}

/// The result of the most recent completed fetch for a path
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct View {
    path: RepoPath,
    tree: IssueTree,
    errors: Option<GqlError>,
}

impl View {
    pub fn path(&self) -> &RepoPath {
        &self.path
    }

    pub fn tree(&self) -> &IssueTree {
        &self.tree
    }

    pub fn organization(&self) -> Option<&Organization> {
        self.tree.organization()
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.tree.repository()
    }

    /// GraphQL errors returned alongside the most recent fetch
    pub fn errors(&self) -> Option<&GqlError> {
        self.errors.as_ref()
    }
}

/// What happened when a response was handed to [`Session::complete()`]
#[derive(Debug)]
pub enum Outcome {
    /// A fetch of issues was merged into the session
    Loaded {
        merged: Merged,
        errors: Option<GqlError>,
    },

    /// A star/unstar mutation completed.  `starred` is the repository's new
    /// `viewerHasStarred` value, if the server returned one.
    Starred {
        starred: Option<bool>,
        errors: Option<GqlError>,
    },

    /// A newer request of the same kind had already been issued, so the
    /// response was discarded
    Superseded,

    /// The request failed; the session is as it was before the request was
    /// issued
    Failed(FetchError),
}

/// The state machine that owns a repository path and the issues accumulated
/// for it.
///
/// A `Session` performs no I/O.  Each trigger (`set_path()`, `submit()`,
/// `fetch_more()`, `toggle_star()`) returns immediately with a [`Ticket`]
/// that the caller sends however it likes; the response (or transport
/// failure) is then passed to [`Session::complete()`].  Responses to fetches
/// and to mutations are only applied if they belong to the most recently
/// issued request of their kind.
#[derive(Clone, Debug, Default)]
pub struct Session {
    limits: QueryLimits,
    path: Option<RepoPath>,
    state: State,
    last_generation: u64,
    pending: HashMap<Generation, Pending>,
    latest_fetch: Option<Generation>,
    latest_star: Option<Generation>,
    star_patch: Option<StarPatch>,
}

impl Session {
    pub fn new(limits: QueryLimits) -> Session {
        Session {
            limits,
            ..Session::default()
        }
    }

    pub fn status(&self) -> Status {
        match self.state {
            State::Idle => Status::Idle,
            State::Loading { .. } => Status::Loading,
            State::Loaded(_) => Status::Loaded,
        }
    }

    /// The most recently committed repository path
    pub fn path(&self) -> Option<&RepoPath> {
        self.path.as_ref()
    }

    /// The path for which issues are currently being fetched, if any
    pub fn loading(&self) -> Option<&RepoPath> {
        match &self.state {
            State::Loading { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The most recently completed view.  While a fetch is outstanding, this
    /// is the view from before the fetch was issued.
    pub fn view(&self) -> Option<&View> {
        match &self.state {
            State::Idle => None,
            State::Loading { prior, .. } => prior.as_ref(),
            State::Loaded(view) => Some(view),
        }
    }

    pub fn organization(&self) -> Option<&Organization> {
        self.view()?.organization()
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.view()?.repository()
    }

    pub fn errors(&self) -> Option<&GqlError> {
        self.view()?.errors()
    }

    /// Number of issued requests whose responses have not yet been passed to
    /// [`Session::complete()`]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Parse & commit a new repository path.  Unless issues for that path are
    /// already loaded or being loaded, a request for the first page of its
    /// issues is returned.
    pub fn set_path(&mut self, path: &str) -> Result<Option<Ticket>, SessionError> {
        let path = path.parse::<RepoPath>()?;
        Ok(self.set_repo_path(path))
    }

    pub fn set_repo_path(&mut self, path: RepoPath) -> Option<Ticket> {
        let shown = self.loading().or_else(|| self.view().map(View::path));
        if shown == Some(&path) {
            tracing::debug!(%path, "Path unchanged; not refetching");
            return None;
        }
        self.path = Some(path.clone());
        Some(self.start_fetch(path, None))
    }

    /// Refetch the first page of issues for the current path
    pub fn submit(&mut self) -> Result<Ticket, SessionError> {
        let path = self.path.clone().ok_or(SessionError::NoPath)?;
        Ok(self.start_fetch(path, None))
    }

    /// Request the page of issues following those accumulated so far
    pub fn fetch_more(&mut self) -> Result<Ticket, SessionError> {
        let view = match &self.state {
            State::Idle => return Err(SessionError::NotLoaded),
            State::Loading { .. } => return Err(SessionError::FetchInFlight),
            State::Loaded(view) => view,
        };
        let repo = view.repository().ok_or(SessionError::NotLoaded)?;
        let cursor = repo.end_cursor().cloned().ok_or(SessionError::NoCursor)?;
        if !repo.has_next_page() {
            tracing::warn!(path = %view.path, "Requesting more issues after the last page");
        }
        let path = view.path.clone();
        Ok(self.start_fetch(path, Some(cursor)))
    }

    /// Star the given repository, or unstar it if `currently_starred` is
    /// true.  This does not affect whether the session is loading.
    pub fn toggle_star(&mut self, repo_id: Id, currently_starred: bool) -> Ticket {
        let mutation = ToggleStar::new(repo_id, StarAction::toggling(currently_starred));
        let generation = self.next_generation();
        let payload = mutation.payload();
        tracing::debug!(
            %generation,
            repo_id = %mutation.repo_id(),
            action = ?mutation.action(),
            "Issuing star mutation"
        );
        self.latest_star = Some(generation);
        self.pending.insert(generation, Pending::Star(mutation));
        Ticket {
            generation,
            payload,
        }
    }

    /// Apply the response (or failure) for the request with the given
    /// generation.  A response that fails to arrive is reported as any error
    /// convertible to [`FetchError`], usually a [`TransportError`].
    pub fn complete<E: Into<FetchError>>(
        &mut self,
        generation: Generation,
        result: Result<Envelope, E>,
    ) -> Result<Outcome, SessionError> {
        let pending = self
            .pending
            .remove(&generation)
            .ok_or(SessionError::UnknownTicket(generation))?;
        let result = result.map_err(Into::into);
        Ok(match pending {
            Pending::Fetch(query) => self.complete_fetch(generation, &query, result),
            Pending::Star(mutation) => self.complete_star(generation, &mutation, result),
        })
    }

    fn next_generation(&mut self) -> Generation {
        self.last_generation += 1;
        Generation(self.last_generation)
    }

    fn start_fetch(&mut self, path: RepoPath, cursor: Option<Cursor>) -> Ticket {
        let query = GetIssuesPage::new(path.clone(), cursor, self.limits);
        let generation = self.next_generation();
        let payload = query.payload();
        tracing::debug!(
            %generation,
            %path,
            cursor = ?query.cursor().map(Cursor::as_str),
            "Issuing fetch for issues"
        );
        let prior = std::mem::take(&mut self.state).into_view();
        self.state = State::Loading { path, prior };
        self.latest_fetch = Some(generation);
        self.pending.insert(generation, Pending::Fetch(query));
        Ticket {
            generation,
            payload,
        }
    }

    fn complete_fetch(
        &mut self,
        generation: Generation,
        query: &GetIssuesPage,
        result: Result<Envelope, FetchError>,
    ) -> Outcome {
        if self.latest_fetch != Some(generation) {
            tracing::warn!(%generation, path = %query.path(), "Discarding superseded issues response");
            return Outcome::Superseded;
        }
        let Interpreted { data, errors } = match interpret(query, result) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%generation, path = %query.path(), error = %e, "Fetch for issues failed");
                self.state = std::mem::take(&mut self.state)
                    .into_view()
                    .map_or(State::Idle, State::Loaded);
                return Outcome::Failed(e);
            }
        };
        let mut fetched = data.flatten();
        let how = Merge::for_cursor(query.cursor());
        let mut tree = match how {
            Merge::Replace => IssueTree::new(),
            Merge::Append => std::mem::take(&mut self.state)
                .into_view()
                .map(|v| v.tree)
                .unwrap_or_default(),
        };
        if how == Merge::Replace {
            self.reapply_star(generation, &mut fetched);
        }
        let merged = tree.merge(fetched, how);
        tracing::info!(
            %generation,
            path = %query.path(),
            appended = merged.appended,
            total = merged.total,
            errors = errors.as_ref().map_or(0, GqlError::len),
            "Loaded issues"
        );
        self.state = State::Loaded(View {
            path: query.path().clone(),
            tree,
            errors: errors.clone(),
        });
        Outcome::Loaded { merged, errors }
    }

    fn complete_star(
        &mut self,
        generation: Generation,
        mutation: &ToggleStar,
        result: Result<Envelope, FetchError>,
    ) -> Outcome {
        if self.latest_star != Some(generation) {
            tracing::warn!(%generation, repo_id = %mutation.repo_id(), "Discarding superseded star response");
            return Outcome::Superseded;
        }
        let Interpreted { data, errors } = match interpret(mutation, result) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%generation, repo_id = %mutation.repo_id(), error = %e, "Star mutation failed");
                return Outcome::Failed(e);
            }
        };
        let starred = data.flatten();
        if let Some(starred) = starred {
            let applied = self
                .view_mut()
                .is_some_and(|v| v.tree.set_starred(mutation.repo_id(), starred));
            tracing::info!(%generation, repo_id = %mutation.repo_id(), starred, applied, "Star mutation completed");
            self.star_patch = self.latest_fetch.map(|cutoff| StarPatch {
                cutoff,
                repo_id: mutation.repo_id().clone(),
                starred,
            });
        }
        Outcome::Starred { starred, errors }
    }

    fn view_mut(&mut self) -> Option<&mut View> {
        match &mut self.state {
            State::Idle => None,
            State::Loading { prior, .. } => prior.as_mut(),
            State::Loaded(view) => Some(view),
        }
    }

    /// A star result applied after a first-page fetch was issued is newer
    /// than the `viewerHasStarred` value in that fetch's response.
    fn reapply_star(&self, generation: Generation, fetched: &mut Option<Organization>) {
        let Some(patch) = &self.star_patch else {
            return;
        };
        if generation > patch.cutoff {
            return;
        }
        if let Some(repo) = fetched
            .as_mut()
            .and_then(|org| org.repository.as_mut())
            .filter(|repo| repo.id == patch.repo_id)
        {
            repo.viewer_has_starred = patch.starred;
        }
    }
}

fn interpret<O: Operation>(
    op: &O,
    result: Result<Envelope, FetchError>,
) -> Result<Interpreted<O::Output>, FetchError> {
    result?.interpret(op).map_err(FetchError::Decode)
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
enum State {
    #[default]
    Idle,
    Loading {
        path: RepoPath,
        prior: Option<View>,
    },
    Loaded(View),
}

impl State {
    fn into_view(self) -> Option<View> {
        match self {
            State::Idle => None,
            State::Loading { prior, .. } => prior,
            State::Loaded(view) => Some(view),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Pending {
    Fetch(GetIssuesPage),
    Star(ToggleStar),
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct StarPatch {
    /// The latest fetch issued when the star result was applied
    cutoff: Generation,
    repo_id: Id,
    starred: bool,
}

/// A failure of a single request.  The session remains usable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to decode GraphQL response data")]
    Decode(#[source] serde_json::Error),
    #[error("the request was abandoned after its sender panicked")]
    Panicked,
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("no repository path has been set")]
    NoPath,
    #[error("no issues have been loaded yet")]
    NotLoaded,
    #[error("a fetch for issues is already in progress")]
    FetchInFlight,
    #[error("the loaded repository has no issue cursor to continue from")]
    NoCursor,
    #[error("no request with generation {0} is pending")]
    UnknownTicket(Generation),
}
