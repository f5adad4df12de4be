//! The daemon's event loop.
//!
//! Owns the call audio tracker and the orchestrator. Requests are applied
//! one at a time in arrival order; audio presence edges are handed to the
//! orchestrator without waiting for the path operations to finish.

use callpath_audio::{CardPair, Orchestrator};
use callpath_core::{AudioEdge, CallAudioTracker, Command, Error as CoreError, StateSnapshot};
use callpath_ipc::{Event, IncomingRequest, Response};
use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::server::{self, Handled};

/// What the loop does after a request.
#[derive(Debug)]
pub enum Step {
    Continue,
    /// Shutdown was requested
    Stop,
    /// Tracker bookkeeping can no longer be trusted
    Fatal(CoreError),
}

pub struct Daemon {
    tracker: CallAudioTracker,
    orchestrator: Orchestrator,
    cards: CardPair,
    events: broadcast::Sender<Event>,
}

impl Daemon {
    #[must_use]
    pub fn new(orchestrator: Orchestrator, cards: CardPair, events: broadcast::Sender<Event>) -> Self {
        Self { tracker: CallAudioTracker::new(), orchestrator, cards, events }
    }

    /// Serve requests until shutdown, then tear down every path.
    ///
    /// # Errors
    /// Returns the tracker error that stopped the loop, if any.
    pub async fn run(
        mut self,
        requests: &mut mpsc::Receiver<IncomingRequest>,
        shutdown: &mut mpsc::Receiver<()>,
    ) -> Result<(), CoreError> {
        info!("Daemon running, waiting for call notifications");

        let fatal = loop {
            tokio::select! {
                Some((client_id, request, response_tx)) = requests.recv() => {
                    debug!(client_id, method = ?request.method, "Handling request");

                    let (result, step) = self.handle(&request.method);
                    reply(client_id, &response_tx, Response { id: request.id, result });

                    match step {
                        Step::Continue => {}
                        Step::Stop => {
                            info!(client_id, "Shutdown requested");
                            break None;
                        }
                        Step::Fatal(e) => break Some(e),
                    }
                }

                Some(()) = self.orchestrator.next_finished(), if !self.orchestrator.is_idle() => {}

                _ = shutdown.recv() => {
                    info!("Shutdown signal received");
                    break None;
                }
            }
        };

        self.finish(fatal).await
    }

    /// Handle one request, returning its result and what the loop does next.
    pub fn handle(&mut self, method: &callpath_ipc::Method) -> (Result<Value, callpath_ipc::ErrorInfo>, Step) {
        let snapshot = self.snapshot();
        match server::handle_request(method, &snapshot) {
            Handled::Reply(result) => (result, Step::Continue),
            Handled::Apply(Command::Shutdown) => (Ok(Value::Null), Step::Stop),
            Handled::Apply(command) => {
                let events = server::notification_events(&command);
                let applied = self.tracker.apply(command);
                self.settle(applied, events)
            }
        }
    }

    /// Act on the outcome of a tracker command.
    pub fn settle(
        &mut self,
        applied: callpath_core::Result<Vec<AudioEdge>>,
        events: Vec<Event>,
    ) -> (Result<Value, callpath_ipc::ErrorInfo>, Step) {
        let result = server::command_result(&applied);
        let step = match applied {
            Ok(edges) => {
                for event in events {
                    let _ = self.events.send(event);
                }
                self.dispatch(edges);
                Step::Continue
            }
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Call audio bookkeeping is inconsistent, shutting down");
                Step::Fatal(e)
            }
            Err(e) => {
                warn!(error = %e, "Rejected call notification");
                let _ = self.events.send(server::error_event(&e));
                Step::Continue
            }
        };
        (result, step)
    }

    /// Tear down any path still in place and wait for it.
    ///
    /// # Errors
    /// Passes `fatal` through once teardown is complete.
    pub async fn finish(&mut self, fatal: Option<CoreError>) -> Result<(), CoreError> {
        info!("Shutting down...");
        let edges = self.tracker.clear();
        self.dispatch(edges);
        self.orchestrator.drain().await;

        fatal.map_or(Ok(()), Err)
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            codec_card: self.cards.codec.clone(),
            modem_card: self.cards.modem.clone(),
            backend: self.orchestrator.backend().to_string(),
            modems: self.tracker.snapshot(),
            audio: self.tracker.audio_status(),
        }
    }

    /// Hand global presence edges to the path manager and announce them.
    fn dispatch(&mut self, edges: Vec<AudioEdge>) {
        for edge in edges {
            self.orchestrator.dispatch(edge);
            let _ = self.events.send(Event::audio(edge));
        }
    }
}

/// Queue a response without waiting on the client.
fn reply(client_id: u64, response_tx: &mpsc::Sender<Response>, response: Response) {
    match response_tx.try_send(response) {
        Ok(()) => {}
        Err(TrySendError::Full(response)) => {
            warn!(client_id, request_id = response.id, "Client is not reading, dropping response");
        }
        Err(TrySendError::Closed(_)) => debug!(client_id, "Client went away before the response"),
    }
}
