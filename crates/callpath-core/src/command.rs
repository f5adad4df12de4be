//! Commands for tracker mutations.
//!
//! Commands are returned by IPC handlers to request state changes
//! that the main daemon loop applies, one at a time, in arrival order.

use crate::call::{CallInfo, CallState, CallStateReason};

/// A command representing a call-signaling notification or control request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A modem's voice interface appeared
    ModemAdded { modem: String },
    /// A modem's voice interface went away
    ModemRemoved { modem: String },
    /// Result of a list-calls query for a modem
    CallsListed { modem: String, calls: Vec<CallInfo> },
    /// A call was added, with its authoritative state
    CallAdded { modem: String, call: CallInfo },
    /// A call was deleted
    CallDeleted { modem: String, call: String },
    /// A call changed state
    CallStateChanged {
        modem: String,
        call: String,
        old: CallState,
        new: CallState,
        reason: CallStateReason,
    },
    /// Request shutdown
    Shutdown,
}

impl Command {
    /// The modem a notification refers to, if any.
    #[must_use]
    pub fn modem(&self) -> Option<&str> {
        match self {
            Self::ModemAdded { modem }
            | Self::ModemRemoved { modem }
            | Self::CallsListed { modem, .. }
            | Self::CallAdded { modem, .. }
            | Self::CallDeleted { modem, .. }
            | Self::CallStateChanged { modem, .. } => Some(modem),
            Self::Shutdown => None,
        }
    }
}
