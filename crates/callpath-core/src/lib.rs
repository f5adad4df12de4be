//! callpath Core - Call audio state tracking and presence aggregation.
//!
//! This crate contains the domain model shared by the daemon and the audio
//! backends: call states, transfer directions, the per-modem call tracker and
//! the global per-direction audio-presence counters. Nothing here performs I/O.

pub mod call;
pub mod command;
pub mod direction;
pub mod error;
pub mod modem;
pub mod presence;
pub mod state;
pub mod tracker;

pub use call::{CallInfo, CallState, CallStateReason};
pub use command::Command;
pub use direction::{Direction, PerDirection};
pub use error::{Error, Result};
pub use modem::ModemTracker;
pub use presence::{AudioEdge, AudioPresence, PresenceCounter};
pub use state::{AudioStatus, CallSnapshot, ModemSnapshot, StateSnapshot};
pub use tracker::CallAudioTracker;
