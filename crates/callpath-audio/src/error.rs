//! Audio server error types.

use thiserror::Error;

use crate::object::ObjectKind;

/// Audio server error type.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio server command failed: {0}")]
    CommandFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected audio server output: {0}")]
    Parse(String),

    #[error("{kind} #{index} not found")]
    ObjectNotFound { kind: ObjectKind, index: u32 },

    #[error("No {kind} found for card `{card}`")]
    EndpointNotFound { kind: ObjectKind, card: String },

    #[error("Failed to load module: {0}")]
    LoadFailed(String),

    #[error("Failed to unload module #{index}: {reason}")]
    UnloadFailed { index: u32, reason: String },

    #[error("Loopback helper failed: {0}")]
    ProcessFailed(String),
}

impl From<serde_json::Error> for AudioError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Result type for audio server operations.
pub type AudioResult<T> = Result<T, AudioError>;
