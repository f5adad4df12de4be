//! callpath IPC - Unix socket protocol and client library.
//!
//! This crate defines the newline-delimited JSON protocol spoken on the
//! daemon's socket. The call-signaling bridge uses it to deliver modem and
//! call notifications; status tools use it to query state and follow events.

pub mod client;
pub mod error;
pub mod events;
pub mod messages;
pub mod server;

pub use client::IpcClient;
pub use error::{IpcError, IpcResult};
pub use events::{AudioEdgeData, CallEventData, CallStateChangedData, ErrorData, Event, EventType, ModemEventData};
pub use messages::{ErrorInfo, Method, Request, Response};
pub use server::{IncomingRequest, IpcServer};

use std::path::PathBuf;

/// Get the default socket path.
///
/// Uses `$XDG_RUNTIME_DIR/callpath/daemon.sock` or falls back to
/// `/run/user/$UID/callpath/daemon.sock`.
#[must_use]
#[allow(unsafe_code)] // libc::getuid() is always safe to call
pub fn socket_path() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(runtime_dir).join("callpath/daemon.sock")
    } else {
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/run/user/{uid}/callpath/daemon.sock"))
    }
}
