//! Status snapshots.

use serde::{Deserialize, Serialize};

use crate::call::CallState;
use crate::direction::PerDirection;

/// One tracked call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSnapshot {
    pub path: String,
    pub state: CallState,
    pub has_audio: PerDirection<bool>,
}

/// One tracked modem and its calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModemSnapshot {
    pub path: String,
    pub calls: Vec<CallSnapshot>,
    /// Calls carrying audio, per direction
    pub audio_count: PerDirection<u32>,
}

/// Global audio presence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioStatus {
    /// Whether a loopback path should exist, per direction
    pub present: PerDirection<bool>,
    /// Modems with at least one call carrying audio, per direction
    pub modems: PerDirection<u32>,
    /// Calls carrying audio across all modems, per direction
    pub calls: PerDirection<u32>,
}

/// Complete snapshot of the daemon's current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Daemon version
    pub version: String,
    /// Card name of the speaker/microphone codec
    pub codec_card: String,
    /// Card name of the modem's audio interface
    pub modem_card: String,
    /// Path manager backend in use
    pub backend: String,
    pub modems: Vec<ModemSnapshot>,
    pub audio: AudioStatus,
}
