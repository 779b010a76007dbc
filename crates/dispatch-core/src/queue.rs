use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::dispatcher::{DispatchOutcome, Dispatcher};
use crate::error::DispatchError;
use crate::ports::{ClassifierPort, InferencePort, ShellPort};
use crate::session::{Session, SessionUpdate};

/// Per-session FIFO of submitted input.
///
/// One worker task drains the queue and runs each dispatch to completion
/// before taking the next, so shell writes never interleave and
/// conversation turns keep submission order. Closing the session abandons
/// the dispatch in flight.
pub struct SessionQueue {
    session: Arc<Session>,
    tx: mpsc::UnboundedSender<String>,
    worker: JoinHandle<Vec<DispatchOutcome>>,
}

impl SessionQueue {
    pub fn spawn<C, S, A>(dispatcher: Arc<Dispatcher<C, S, A>>, session: Arc<Session>) -> Self
    where
        C: ClassifierPort + 'static,
        S: ShellPort + 'static,
        A: InferencePort + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let worker_session = session.clone();
        let mut updates = session.subscribe();
        let worker = tokio::spawn(async move {
            let mut outcomes = Vec::new();
            while let Some(input) = rx.recv().await {
                let outcome = tokio::select! {
                    biased;
                    _ = closed(&worker_session, &mut updates) => {
                        dispatcher.discard(&worker_session, "session closed mid-dispatch")
                    }
                    outcome = dispatcher.dispatch(&input, &worker_session) => outcome,
                };
                debug!(session = %worker_session.id(), ?outcome, "dispatch finished");
                outcomes.push(outcome);
            }
            outcomes
        });
        Self { session, tx, worker }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn submit(&self, input: impl Into<String>) -> Result<(), DispatchError> {
        if !self.session.is_open() {
            return Err(DispatchError::SessionClosed);
        }
        self.tx.send(input.into()).map_err(|_| DispatchError::SessionClosed)
    }

    /// Stops accepting input and waits for everything already submitted.
    /// Returns the outcomes in submission order.
    pub async fn finish(self) -> Vec<DispatchOutcome> {
        drop(self.tx);
        match self.worker.await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                error!(session = %self.session.id(), error = %e, "session worker failed");
                Vec::new()
            }
        }
    }

    /// Closes the session. Anything still queued or in flight is discarded.
    pub async fn close(self) -> Vec<DispatchOutcome> {
        self.session.close();
        self.finish().await
    }
}

/// Resolves once the session is closed.
async fn closed(session: &Session, updates: &mut broadcast::Receiver<SessionUpdate>) {
    loop {
        if !session.is_open() {
            return;
        }
        match updates.recv().await {
            Ok(SessionUpdate::Closed) => return,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
