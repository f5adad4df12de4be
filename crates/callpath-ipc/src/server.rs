//! IPC server implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::error::{IpcError, IpcResult};
use crate::events::{Event, EventType};
use crate::messages::{ErrorInfo, Method, Request, Response};

/// A request forwarded to the daemon: client id, request, reply channel.
pub type IncomingRequest = (u64, Request, mpsc::Sender<Response>);

/// IPC server that listens for client connections.
///
/// Subscriptions are handled per connection by the server itself; every
/// other request is forwarded to the daemon through the request channel.
pub struct IpcServer {
    listener: UnixListener,
    next_client_id: AtomicU64,
    event_tx: broadcast::Sender<Event>,
    request_tx: mpsc::Sender<IncomingRequest>,
}

impl IpcServer {
    /// Create a new IPC server bound to the given socket path.
    ///
    /// # Errors
    /// Returns an error if the socket cannot be created.
    pub async fn bind(socket_path: &Path) -> IpcResult<(Self, mpsc::Receiver<IncomingRequest>)> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Remove stale socket file if it exists
        if socket_path.exists() {
            tokio::fs::remove_file(socket_path).await?;
        }

        let listener = UnixListener::bind(socket_path)?;
        info!(?socket_path, "IPC server listening");

        let (event_tx, _) = broadcast::channel(256);
        let (request_tx, request_rx) = mpsc::channel(64);

        Ok((Self { listener, next_client_id: AtomicU64::new(1), event_tx, request_tx }, request_rx))
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => {
                    let client_id = self.next_client_id.fetch_add(1, Ordering::SeqCst);
                    info!(client_id, "Client connected");

                    let event_rx = self.event_tx.subscribe();
                    let request_tx = self.request_tx.clone();

                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_client(client_id, stream, event_rx, request_tx).await {
                            error!(client_id, error = %e, "Client error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Accept error");
                }
            }
        }
    }

    /// Get a clone of the event sender for broadcasting from other tasks.
    #[must_use]
    pub fn event_sender(&self) -> broadcast::Sender<Event> {
        self.event_tx.clone()
    }

    async fn handle_client(
        client_id: u64,
        stream: UnixStream,
        mut event_rx: broadcast::Receiver<Event>,
        request_tx: mpsc::Sender<IncomingRequest>,
    ) -> IpcResult<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        let (response_tx, mut response_rx) = mpsc::channel::<Response>(16);
        // Empty means every event
        let mut subscriptions: HashSet<EventType> = HashSet::new();

        loop {
            tokio::select! {
                // Read request from client
                result = reader.read_line(&mut line) => {
                    match result {
                        Ok(0) => {
                            debug!(client_id, "Client disconnected");
                            break;
                        }
                        Ok(_) => {
                            match serde_json::from_str::<Request>(&line) {
                                Ok(request) => {
                                    let id = request.id;
                                    debug!(client_id, request_id = id, "Received request");
                                    if let Some(response) = update_subscriptions(&mut subscriptions, &request) {
                                        write_line(&mut writer, &response).await?;
                                    } else if request_tx.send((client_id, request, response_tx.clone())).await.is_err() {
                                        let error = ErrorInfo::new(ErrorInfo::UNAVAILABLE, "Daemon is shutting down");
                                        write_line(&mut writer, &Response::error(id, error)).await?;
                                    }
                                }
                                Err(e) => warn!(client_id, error = %e, "Invalid request format"),
                            }
                            line.clear();
                        }
                        Err(e) => {
                            error!(client_id, error = %e, "Read error");
                            break;
                        }
                    }
                }

                // Send response to client
                Some(response) = response_rx.recv() => {
                    write_line(&mut writer, &response).await?;
                }

                // Forward events to client
                result = event_rx.recv() => {
                    match result {
                        Ok(event) => {
                            if subscriptions.is_empty() || subscriptions.contains(&event.event) {
                                write_line(&mut writer, &event).await?;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(client_id, skipped, "Client fell behind, events dropped");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }

        info!(client_id, "Client handler exiting");
        Ok(())
    }
}

/// Apply a subscription request, returning its response.
///
/// Returns `None` for requests that are not about subscriptions.
fn update_subscriptions(subscriptions: &mut HashSet<EventType>, request: &Request) -> Option<Response> {
    let (events, subscribe) = match &request.method {
        Method::Subscribe { events } => (events, true),
        Method::Unsubscribe { events } => (events, false),
        _ => return None,
    };

    let parsed: Result<Vec<EventType>, IpcError> = events.iter().map(|e| e.parse()).collect();
    let response = match parsed {
        Ok(types) => {
            for event in types {
                if subscribe {
                    subscriptions.insert(event);
                } else {
                    subscriptions.remove(&event);
                }
            }
            let mut current: Vec<EventType> = subscriptions.iter().copied().collect();
            current.sort_by_key(|e| format!("{e:?}"));
            Response::ok(request.id, json!({ "subscriptions": current }))
        }
        Err(e) => Response::error(request.id, ErrorInfo::new(ErrorInfo::BAD_REQUEST, e.to_string())),
    };
    Some(response)
}

async fn write_line(writer: &mut OwnedWriteHalf, message: &impl Serialize) -> IpcResult<()> {
    let json = serde_json::to_string(message)? + "\n";
    writer.write_all(json.as_bytes()).await?;
    Ok(())
}
