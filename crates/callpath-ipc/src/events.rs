//! IPC event types (server to client).

use std::str::FromStr;

use callpath_core::{AudioEdge, CallState, CallStateReason, Direction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IpcError;

/// Event sent from daemon to subscribed clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type
    pub event: EventType,
    /// Event data
    pub data: Value,
}

impl Event {
    /// Build an event from any serializable payload.
    pub fn new(event: EventType, data: &impl Serialize) -> Self {
        Self { event, data: serde_json::to_value(data).unwrap_or_default() }
    }

    /// Event for a global audio presence edge.
    #[must_use]
    pub fn audio(edge: AudioEdge) -> Self {
        let event = if edge.is_present() { EventType::AudioPresent } else { EventType::AudioAbsent };
        let direction = edge.direction();
        Self::new(event, &AudioEdgeData { direction, description: direction.description().to_string() })
    }
}

/// Types of events that can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Call audio started flowing in a direction
    AudioPresent,
    /// Call audio stopped flowing in a direction
    AudioAbsent,
    /// Call tracked
    CallAdded,
    /// Call no longer tracked
    CallRemoved,
    /// Call changed state
    CallStateChanged,
    /// Modem tracked
    ModemAdded,
    /// Modem no longer tracked
    ModemRemoved,
    /// A notification was rejected
    Error,
}

impl FromStr for EventType {
    type Err = IpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(s.to_string()))
            .map_err(|_| IpcError::UnknownEvent(s.to_string()))
    }
}

/// Audio presence event data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioEdgeData {
    pub direction: Direction,
    pub description: String,
}

/// Modem added/removed event data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemEventData {
    pub modem: String,
}

/// Call added/removed event data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEventData {
    pub modem: String,
    pub call: String,
    /// State at the time the call was added
    pub state: Option<CallState>,
}

/// Call state change event data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStateChangedData {
    pub modem: String,
    pub call: String,
    pub old: CallState,
    pub new: CallState,
    pub reason: CallStateReason,
}

/// Error event data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    pub code: i32,
    pub message: String,
}
