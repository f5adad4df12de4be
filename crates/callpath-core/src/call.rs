//! Call states and call objects reported by the voice interface.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::Error;

/// State of a voice call as reported by the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    /// State not (yet) known
    #[default]
    Unknown,
    /// Outgoing call being set up
    Dialing,
    /// Incoming call ringing locally
    RingingIn,
    /// Outgoing call ringing at the remote end
    RingingOut,
    /// Call connected
    Active,
    /// Call on hold
    Held,
    /// Call finished
    Terminated,
}

impl CallState {
    /// Whether a call in this state carries audio in `direction`.
    ///
    /// Ringing-out carries audio only from the network so the caller hears
    /// the ringback tone.
    #[must_use]
    pub fn has_audio(self, direction: Direction) -> bool {
        match self {
            Self::Active => true,
            Self::RingingOut => direction == Direction::FromNetwork,
            Self::Unknown | Self::Dialing | Self::RingingIn | Self::Held | Self::Terminated => {
                false
            }
        }
    }

    /// Canonical name as used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Dialing => "dialing",
            Self::RingingIn => "ringing_in",
            Self::RingingOut => "ringing_out",
            Self::Active => "active",
            Self::Held => "held",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "unknown" => Ok(Self::Unknown),
            "dialing" => Ok(Self::Dialing),
            "ringing_in" => Ok(Self::RingingIn),
            "ringing_out" => Ok(Self::RingingOut),
            "active" => Ok(Self::Active),
            "held" => Ok(Self::Held),
            "terminated" => Ok(Self::Terminated),
            _ => Err(Error::InvalidCallState(s.to_string())),
        }
    }
}

/// Reason attached to a call state change. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStateReason {
    #[default]
    Unknown,
    OutgoingStarted,
    IncomingNew,
    Accepted,
    Terminated,
    RefusedOrBusy,
    Error,
    AudioSetupFailed,
    Transferred,
    Deflected,
}

/// An authoritative call object, as returned by a list-calls query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    /// Opaque call handle (e.g. a D-Bus object path)
    pub path: String,
    /// Current call state
    pub state: CallState,
}

impl CallInfo {
    #[must_use]
    pub fn new(path: impl Into<String>, state: CallState) -> Self {
        Self { path: path.into(), state }
    }
}
