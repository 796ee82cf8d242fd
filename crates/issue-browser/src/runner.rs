use crate::session::{FetchError, Generation, Outcome, Session, SessionError, Ticket};
use gqlient::{Envelope, Transport};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

/// Drives a [`Session`] by sending each of its requests on a background
/// thread.  Triggers return as soon as the request has been dispatched;
/// responses are applied to the session when the caller calls
/// [`Runner::poll()`], [`Runner::wait()`], or [`Runner::settle()`].
#[derive(Debug)]
pub struct Runner<T> {
    session: Session,
    transport: Arc<T>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

#[derive(Debug)]
struct Completion {
    generation: Generation,
    result: Result<Envelope, FetchError>,
}

impl<T: Transport + Send + Sync + 'static> Runner<T> {
    pub fn new(transport: T, session: Session) -> Runner<T> {
        let (sender, receiver) = channel();
        Runner {
            session,
            transport: Arc::new(transport),
            sender,
            receiver,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Set the repository path.  Returns `true` if a fetch was dispatched.
    pub fn set_path(&mut self, path: &str) -> Result<bool, SessionError> {
        match self.session.set_path(path)? {
            Some(ticket) => {
                self.dispatch(ticket);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn submit(&mut self) -> Result<(), SessionError> {
        let ticket = self.session.submit()?;
        self.dispatch(ticket);
        Ok(())
    }

    pub fn fetch_more(&mut self) -> Result<(), SessionError> {
        let ticket = self.session.fetch_more()?;
        self.dispatch(ticket);
        Ok(())
    }

    /// Toggle whether the viewer has starred the currently loaded repository
    pub fn toggle_star(&mut self) -> Result<(), SessionError> {
        let repo = self.session.repository().ok_or(SessionError::NotLoaded)?;
        let (repo_id, starred) = (repo.id.clone(), repo.viewer_has_starred);
        let ticket = self.session.toggle_star(repo_id, starred);
        self.dispatch(ticket);
        Ok(())
    }

    fn dispatch(&self, ticket: Ticket) {
        let Ticket {
            generation,
            payload,
        } = ticket;
        let transport = Arc::clone(&self.transport);
        let sender = self.sender.clone();
        tracing::trace!(%generation, "Dispatching request");
        thread::spawn(move || {
            // Every dispatched ticket yields exactly one completion, even if
            // the transport panics.
            let result = match catch_unwind(AssertUnwindSafe(|| transport.send(&payload))) {
                Ok(r) => r.map_err(FetchError::from),
                Err(_) => {
                    tracing::error!(%generation, "Transport panicked while sending request");
                    Err(FetchError::Panicked)
                }
            };
            // The receiver only goes away when the runner is dropped, at
            // which point nobody cares about the response.
            let _ = sender.send(Completion { generation, result });
        });
    }

    /// Apply a response that has already arrived, if any
    pub fn poll(&mut self) -> Option<Outcome> {
        while let Ok(completion) = self.receiver.try_recv() {
            if let Some(outcome) = self.apply(completion) {
                return Some(outcome);
            }
        }
        None
    }

    /// Block until the next response arrives and apply it.  Returns `None`
    /// if no requests are in flight.
    pub fn wait(&mut self) -> Option<Outcome> {
        while self.session.in_flight() > 0 {
            let completion = self.receiver.recv().ok()?;
            if let Some(outcome) = self.apply(completion) {
                return Some(outcome);
            }
        }
        None
    }

    /// Wait for all in-flight requests to complete, returning their outcomes
    /// in the order they were applied
    pub fn settle(&mut self) -> Vec<Outcome> {
        std::iter::from_fn(|| self.wait()).collect()
    }

    fn apply(&mut self, completion: Completion) -> Option<Outcome> {
        let Completion { generation, result } = completion;
        match self.session.complete(generation, result) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(%generation, error = %e, "Ignoring response");
                None
            }
        }
    }
}
