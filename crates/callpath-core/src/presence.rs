//! Reference-counted audio presence with edge detection.
//!
//! Only the edges of a counter (0 -> 1 and N -> 0) are externally
//! significant; they are the sole triggers for provisioning and teardown of
//! loopback paths.

use serde::{Deserialize, Serialize};

use crate::direction::{Direction, PerDirection};
use crate::error::{Error, Result};

/// A transition of a presence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "edge", content = "direction")]
pub enum AudioEdge {
    /// Counter went 0 -> 1
    Present(Direction),
    /// Counter went N -> 0
    Absent(Direction),
}

impl AudioEdge {
    #[must_use]
    pub fn direction(self) -> Direction {
        match self {
            Self::Present(d) | Self::Absent(d) => d,
        }
    }

    #[must_use]
    pub fn is_present(self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// A non-negative counter for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceCounter {
    direction: Direction,
    count: u32,
}

impl PresenceCounter {
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self { direction, count: 0 }
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.count > 0
    }

    /// Increment, returning the edge if the counter went 0 -> 1.
    pub fn increment(&mut self) -> Option<AudioEdge> {
        self.count += 1;
        (self.count == 1).then_some(AudioEdge::Present(self.direction))
    }

    /// Decrement, returning the edge if the counter reached 0.
    ///
    /// # Errors
    /// Returns [`Error::CounterUnderflow`] if the counter is already 0.
    pub fn decrement(&mut self) -> Result<Option<AudioEdge>> {
        if self.count == 0 {
            return Err(Error::CounterUnderflow(self.direction));
        }
        self.count -= 1;
        Ok((self.count == 0).then_some(AudioEdge::Absent(self.direction)))
    }

    /// Force the counter to zero, returning the edge if it was nonzero.
    pub fn reset(&mut self) -> Option<AudioEdge> {
        let was_present = self.is_present();
        self.count = 0;
        was_present.then_some(AudioEdge::Absent(self.direction))
    }
}

/// Global audio presence across every modem, one counter per direction.
///
/// Each counter counts modems whose own counter for that direction is
/// nonzero; it is fed with the per-modem edges.
#[derive(Debug, Clone)]
pub struct AudioPresence {
    counters: PerDirection<PresenceCounter>,
}

impl AudioPresence {
    #[must_use]
    pub fn new() -> Self {
        Self { counters: PerDirection::from_fn(PresenceCounter::new) }
    }

    /// Apply a per-modem edge, returning the resulting global edge, if any.
    ///
    /// # Errors
    /// Returns [`Error::CounterUnderflow`] for an absent edge with no
    /// matching present edge.
    pub fn apply(&mut self, edge: AudioEdge) -> Result<Option<AudioEdge>> {
        let counter = self.counters.get_mut(edge.direction());
        match edge {
            AudioEdge::Present(_) => Ok(counter.increment()),
            AudioEdge::Absent(_) => counter.decrement(),
        }
    }

    #[must_use]
    pub fn is_present(&self, direction: Direction) -> bool {
        self.counters.get(direction).is_present()
    }

    #[must_use]
    pub fn count(&self, direction: Direction) -> u32 {
        self.counters.get(direction).count()
    }

    /// Force both counters to zero, returning an absent edge for each
    /// direction that was present.
    pub fn clear(&mut self) -> Vec<AudioEdge> {
        Direction::ALL.iter().filter_map(|d| self.counters.get_mut(*d).reset()).collect()
    }
}

impl Default for AudioPresence {
    fn default() -> Self {
        Self::new()
    }
}
