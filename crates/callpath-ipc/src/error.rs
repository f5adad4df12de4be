//! IPC error types.

use thiserror::Error;

/// IPC error type.
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Server error {code}: {message}")]
    ServerError { code: i32, message: String },

    #[error("Unknown event type: {0}")]
    UnknownEvent(String),
}

/// Result type for IPC operations.
pub type IpcResult<T> = Result<T, IpcError>;
