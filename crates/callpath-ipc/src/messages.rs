//! IPC message types.

use callpath_core::{CallInfo, CallState, CallStateReason};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request envelope sent from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique request ID for matching responses
    pub id: u64,
    /// The method to invoke
    pub method: Method,
}

/// Response envelope sent from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID this is responding to
    pub id: u64,
    /// Result of the request
    pub result: Result<Value, ErrorInfo>,
}

impl Response {
    #[must_use]
    pub fn ok(id: u64, value: Value) -> Self {
        Self { id, result: Ok(value) }
    }

    #[must_use]
    pub fn error(id: u64, error: ErrorInfo) -> Self {
        Self { id, result: Err(error) }
    }
}

/// Error information in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
}

impl ErrorInfo {
    /// Malformed request or unknown event name
    pub const BAD_REQUEST: i32 = 400;
    /// Unknown modem or call
    pub const NOT_FOUND: i32 = 404;
    /// Duplicate modem or call
    pub const CONFLICT: i32 = 409;
    /// Daemon is shutting down or its state is no longer trustworthy
    pub const UNAVAILABLE: i32 = 503;

    /// Create a new error.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Methods that can be invoked via IPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params")]
pub enum Method {
    // Call signaling notifications
    /// A modem's voice interface appeared
    ModemAdded { modem: String },
    /// A modem's voice interface went away
    ModemRemoved { modem: String },
    /// Current calls of a modem, as returned by a list-calls query
    CallsListed { modem: String, calls: Vec<CallInfo> },
    /// A call was added; `call` is the authoritative call object
    CallAdded { modem: String, call: CallInfo },
    /// A call was deleted
    CallDeleted { modem: String, call: String },
    /// A call changed state
    CallStateChanged {
        modem: String,
        call: String,
        old: CallState,
        new: CallState,
        #[serde(default)]
        reason: CallStateReason,
    },

    // State queries
    /// Get the current daemon state snapshot
    GetState,
    /// Get global audio presence
    GetAudioStatus,

    // Subscriptions
    /// Subscribe to event types
    Subscribe { events: Vec<String> },
    /// Unsubscribe from event types
    Unsubscribe { events: Vec<String> },

    // System
    /// Request graceful shutdown
    Shutdown,
}
