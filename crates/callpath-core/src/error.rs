//! Error types for callpath core.

use thiserror::Error;

use crate::direction::Direction;

/// Core error type for call tracking operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Modem not found: {0}")]
    ModemNotFound(String),

    #[error("Modem already tracked: {0}")]
    DuplicateModem(String),

    #[error("Call `{call}` not found on modem `{modem}`")]
    CallNotFound { modem: String, call: String },

    #[error("Call `{call}` already tracked on modem `{modem}`")]
    DuplicateCall { modem: String, call: String },

    #[error("Invalid call state: {0}")]
    InvalidCallState(String),

    #[error("Audio presence counter underflow ({0})")]
    CounterUnderflow(Direction),
}

impl Error {
    /// Whether this error is an invariant violation rather than a runtime condition.
    ///
    /// Fatal errors mean the tracker's bookkeeping can no longer be trusted.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CounterUnderflow(_))
    }
}

/// Result type alias for callpath core operations.
pub type Result<T> = std::result::Result<T, Error>;
