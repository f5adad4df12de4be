//! Per-modem call audio tracking.
//!
//! A [`ModemTracker`] owns the calls of one modem's voice interface and
//! keeps, for each direction, a count of the calls currently carrying audio.
//! Every mutation returns the per-modem [`AudioEdge`]s it produced, in order.
//!
//! Calls are evaluated independently of one another: a call going on hold
//! while another becomes active is not reconciled, each call's own state
//! transition decides its contribution to the counters.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::call::{CallInfo, CallState, CallStateReason};
use crate::direction::{Direction, PerDirection};
use crate::error::{Error, Result};
use crate::presence::{AudioEdge, PresenceCounter};
use crate::state::{CallSnapshot, ModemSnapshot};

/// A call tracked by a modem.
#[derive(Debug, Clone)]
struct TrackedCall {
    state: CallState,
    /// Audio presence cached from the last state evaluation
    has_audio: PerDirection<bool>,
}

/// Tracks the calls of a single modem.
#[derive(Debug)]
pub struct ModemTracker {
    /// Modem handle (e.g. D-Bus object path)
    path: String,
    calls: HashMap<String, TrackedCall>,
    audio_count: PerDirection<PresenceCounter>,
}

impl ModemTracker {
    /// Create a tracker with no calls.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            calls: HashMap::new(),
            audio_count: PerDirection::from_fn(PresenceCounter::new),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of calls currently carrying audio in `direction`.
    #[must_use]
    pub fn audio_count(&self, direction: Direction) -> u32 {
        self.audio_count.get(direction).count()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    #[must_use]
    pub fn has_call(&self, path: &str) -> bool {
        self.calls.contains_key(path)
    }

    /// Start tracking a call in its current state.
    ///
    /// The call is evaluated as a transition from a no-audio baseline.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateCall`] if the call is already tracked.
    pub fn add_call(&mut self, call: &CallInfo) -> Result<Vec<AudioEdge>> {
        if self.calls.contains_key(&call.path) {
            return Err(Error::DuplicateCall { modem: self.path.clone(), call: call.path.clone() });
        }

        let has_audio = PerDirection::from_fn(|d| call.state.has_audio(d));
        let mut edges = Vec::new();
        for direction in Direction::ALL {
            if *has_audio.get(direction) {
                edges.extend(self.audio_count.get_mut(direction).increment());
            }
        }

        self.calls.insert(call.path.clone(), TrackedCall { state: call.state, has_audio });
        debug!(modem = %self.path, call = %call.path, state = %call.state, "Call added");

        Ok(edges)
    }

    /// Seed the tracker from a list-calls result.
    ///
    /// Calls that are already tracked are skipped with a warning.
    pub fn add_calls(&mut self, calls: &[CallInfo]) -> Vec<AudioEdge> {
        let mut edges = Vec::new();
        for call in calls {
            match self.add_call(call) {
                Ok(e) => edges.extend(e),
                Err(e) => warn!(error = %e, "Skipping listed call"),
            }
        }
        edges
    }

    /// Stop tracking a call.
    ///
    /// Any direction the call was carrying audio in is released first.
    ///
    /// # Errors
    /// Returns [`Error::CallNotFound`] for an unknown call, or
    /// [`Error::CounterUnderflow`] if the bookkeeping is corrupt.
    pub fn remove_call(&mut self, path: &str) -> Result<Vec<AudioEdge>> {
        let Some(call) = self.calls.get(path) else {
            return Err(Error::CallNotFound { modem: self.path.clone(), call: path.to_string() });
        };

        let had_audio = call.has_audio;
        let mut edges = Vec::new();
        for direction in Direction::ALL {
            if *had_audio.get(direction) {
                edges.extend(self.audio_count.get_mut(direction).decrement()?);
            }
        }

        self.calls.remove(path);
        debug!(modem = %self.path, call = %path, "Call removed");

        Ok(edges)
    }

    /// Apply a state change notification for a call.
    ///
    /// For each direction the audio presence derived from `old` and `new`
    /// decides whether the call gained or lost audio. If the notification's
    /// `old` state disagrees with what was cached for the call, the cached
    /// value wins so the counters keep matching the tracked calls.
    ///
    /// # Errors
    /// Returns [`Error::CallNotFound`] for an unknown call, or
    /// [`Error::CounterUnderflow`] if the bookkeeping is corrupt.
    pub fn state_changed(
        &mut self,
        path: &str,
        old: CallState,
        new: CallState,
        reason: CallStateReason,
    ) -> Result<Vec<AudioEdge>> {
        let Some(call) = self.calls.get_mut(path) else {
            return Err(Error::CallNotFound { modem: self.path.clone(), call: path.to_string() });
        };

        debug!(modem = %self.path, call = %path, %old, %new, ?reason, "Call state changed");

        if call.state != old {
            warn!(
                modem = %self.path,
                call = %path,
                cached = %call.state,
                reported = %old,
                "Reported previous call state differs from tracked state"
            );
        }

        let mut edges = Vec::new();
        for direction in Direction::ALL {
            let reported_had = old.has_audio(direction);
            let cached_had = *call.has_audio.get(direction);
            if reported_had != cached_had {
                warn!(
                    modem = %self.path,
                    call = %path,
                    %direction,
                    cached_had,
                    "Previous audio presence mismatch, using cached value"
                );
            }
            let has_audio = new.has_audio(direction);
            let counter = self.audio_count.get_mut(direction);

            if !cached_had && has_audio {
                debug!(call = %path, %direction, "Call gained audio");
                edges.extend(counter.increment());
            } else if cached_had && !has_audio {
                debug!(call = %path, %direction, "Call lost audio");
                edges.extend(counter.decrement()?);
            }
            *call.has_audio.get_mut(direction) = has_audio;
        }
        call.state = new;

        Ok(edges)
    }

    /// Drop every call and force both counters to zero.
    ///
    /// Returns an absent edge for each direction that had audio.
    pub fn clear(&mut self) -> Vec<AudioEdge> {
        self.calls.clear();
        let edges: Vec<AudioEdge> =
            Direction::ALL.iter().filter_map(|d| self.audio_count.get_mut(*d).reset()).collect();
        if !edges.is_empty() {
            debug!(modem = %self.path, "Modem audio cleared");
        }
        edges
    }

    /// Snapshot of the tracked calls, sorted by call path.
    #[must_use]
    pub fn snapshot(&self) -> ModemSnapshot {
        let mut calls: Vec<CallSnapshot> = self
            .calls
            .iter()
            .map(|(path, call)| CallSnapshot {
                path: path.clone(),
                state: call.state,
                has_audio: call.has_audio,
            })
            .collect();
        calls.sort_by(|a, b| a.path.cmp(&b.path));

        ModemSnapshot {
            path: self.path.clone(),
            calls,
            audio_count: PerDirection::from_fn(|d| self.audio_count(d)),
        }
    }
}
