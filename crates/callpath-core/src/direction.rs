//! Audio transfer directions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of call audio relative to the cellular network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Audio arriving from the network, played on the speaker
    FromNetwork,
    /// Audio captured by the microphone, sent to the network
    ToNetwork,
}

impl Direction {
    /// Both directions, in a fixed order.
    pub const ALL: [Self; 2] = [Self::FromNetwork, Self::ToNetwork];

    /// Human-readable description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::FromNetwork => "from network",
            Self::ToNetwork => "to network",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A pair of values, one per [`Direction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerDirection<T> {
    pub from_network: T,
    pub to_network: T,
}

impl<T> PerDirection<T> {
    #[must_use]
    pub fn new(from_network: T, to_network: T) -> Self {
        Self { from_network, to_network }
    }

    /// Build a pair by evaluating `f` for each direction.
    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self { from_network: f(Direction::FromNetwork), to_network: f(Direction::ToNetwork) }
    }

    #[must_use]
    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::FromNetwork => &self.from_network,
            Direction::ToNetwork => &self.to_network,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::FromNetwork => &mut self.from_network,
            Direction::ToNetwork => &mut self.to_network,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerDirection<U> {
        PerDirection { from_network: f(&self.from_network), to_network: f(&self.to_network) }
    }
}
