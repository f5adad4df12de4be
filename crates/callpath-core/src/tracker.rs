//! Multi-modem call audio tracking.
//!
//! [`CallAudioTracker`] owns one [`ModemTracker`] per modem and the global
//! per-direction [`AudioPresence`]. Per-modem edges are fed into the global
//! counters; only the resulting global edges leave this module.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::command::Command;
use crate::direction::{Direction, PerDirection};
use crate::error::{Error, Result};
use crate::modem::ModemTracker;
use crate::presence::{AudioEdge, AudioPresence};
use crate::state::{AudioStatus, ModemSnapshot};

/// Aggregates call audio across every modem.
#[derive(Debug, Default)]
pub struct CallAudioTracker {
    modems: HashMap<String, ModemTracker>,
    presence: AudioPresence,
}

impl CallAudioTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a modem.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateModem`] if the modem is already tracked.
    pub fn add_modem(&mut self, path: &str) -> Result<()> {
        if self.modems.contains_key(path) {
            return Err(Error::DuplicateModem(path.to_string()));
        }
        self.modems.insert(path.to_string(), ModemTracker::new(path));
        info!(modem = %path, "Modem added");
        Ok(())
    }

    /// Stop tracking a modem, releasing any audio its calls held.
    ///
    /// # Errors
    /// Returns [`Error::ModemNotFound`] for an unknown modem, or
    /// [`Error::CounterUnderflow`] if the bookkeeping is corrupt.
    pub fn remove_modem(&mut self, path: &str) -> Result<Vec<AudioEdge>> {
        let Some(mut modem) = self.modems.remove(path) else {
            return Err(Error::ModemNotFound(path.to_string()));
        };
        info!(modem = %path, calls = modem.call_count(), "Modem removed");
        let edges = modem.clear();
        self.feed(edges)
    }

    /// Apply a command, returning the global edges it produced.
    ///
    /// # Errors
    /// Non-fatal errors report notifications that do not match the tracked
    /// state; nothing was changed. Fatal errors (see [`Error::is_fatal`])
    /// mean the counters can no longer be trusted.
    pub fn apply(&mut self, command: Command) -> Result<Vec<AudioEdge>> {
        match command {
            Command::ModemAdded { modem } => {
                self.add_modem(&modem)?;
                Ok(Vec::new())
            }
            Command::ModemRemoved { modem } => self.remove_modem(&modem),
            Command::CallsListed { modem, calls } => {
                let edges = self.modem_mut(&modem)?.add_calls(&calls);
                self.feed(edges)
            }
            Command::CallAdded { modem, call } => {
                let edges = self.modem_mut(&modem)?.add_call(&call)?;
                self.feed(edges)
            }
            Command::CallDeleted { modem, call } => {
                let edges = self.modem_mut(&modem)?.remove_call(&call)?;
                self.feed(edges)
            }
            Command::CallStateChanged { modem, call, old, new, reason } => {
                let edges = self.modem_mut(&modem)?.state_changed(&call, old, new, reason)?;
                self.feed(edges)
            }
            Command::Shutdown => Ok(self.clear()),
        }
    }

    /// Tear down every modem and force the global counters to zero.
    pub fn clear(&mut self) -> Vec<AudioEdge> {
        for modem in self.modems.values_mut() {
            modem.clear();
        }
        self.modems.clear();
        let edges = self.presence.clear();
        if !edges.is_empty() {
            info!(count = edges.len(), "Audio presence cleared");
        }
        edges
    }

    #[must_use]
    pub fn is_present(&self, direction: Direction) -> bool {
        self.presence.is_present(direction)
    }

    #[must_use]
    pub fn modem_count(&self) -> usize {
        self.modems.len()
    }

    /// Snapshot of every modem, sorted by modem path.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ModemSnapshot> {
        let mut modems: Vec<ModemSnapshot> = self.modems.values().map(ModemTracker::snapshot).collect();
        modems.sort_by(|a, b| a.path.cmp(&b.path));
        modems
    }

    #[must_use]
    pub fn audio_status(&self) -> AudioStatus {
        AudioStatus {
            present: PerDirection::from_fn(|d| self.presence.is_present(d)),
            modems: PerDirection::from_fn(|d| self.presence.count(d)),
            calls: PerDirection::from_fn(|d| self.modems.values().map(|m| m.audio_count(d)).sum()),
        }
    }

    fn modem_mut(&mut self, path: &str) -> Result<&mut ModemTracker> {
        self.modems.get_mut(path).ok_or_else(|| Error::ModemNotFound(path.to_string()))
    }

    /// Feed per-modem edges into the global counters.
    fn feed(&mut self, edges: Vec<AudioEdge>) -> Result<Vec<AudioEdge>> {
        let mut global = Vec::new();
        for edge in edges {
            if let Some(edge) = self.presence.apply(edge)? {
                debug!(?edge, "Global audio presence changed");
                global.push(edge);
            } else {
                debug!(?edge, "Modem edge absorbed by global presence");
            }
        }
        Ok(global)
    }
}

impl Drop for CallAudioTracker {
    fn drop(&mut self) {
        if Direction::ALL.iter().any(|d| self.presence.is_present(*d)) {
            warn!("Call audio tracker dropped while audio present");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{CallInfo, CallState, CallStateReason};
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    const MODEM: &str = "/org/freedesktop/ModemManager1/Modem/0";
    const MODEM2: &str = "/org/freedesktop/ModemManager1/Modem/1";

    fn added(modem: &str, call: &str, state: CallState) -> Command {
        Command::CallAdded { modem: modem.into(), call: CallInfo::new(call, state) }
    }

    fn changed(modem: &str, call: &str, old: CallState, new: CallState) -> Command {
        Command::CallStateChanged {
            modem: modem.into(),
            call: call.into(),
            old,
            new,
            reason: CallStateReason::Unknown,
        }
    }

    fn deleted(modem: &str, call: &str) -> Command {
        Command::CallDeleted { modem: modem.into(), call: call.into() }
    }

    fn tracker_with(modems: &[&str]) -> CallAudioTracker {
        let mut tracker = CallAudioTracker::new();
        for modem in modems {
            tracker.add_modem(modem).unwrap();
        }
        tracker
    }

    const BOTH_PRESENT: [AudioEdge; 2] =
        [AudioEdge::Present(Direction::FromNetwork), AudioEdge::Present(Direction::ToNetwork)];
    const BOTH_ABSENT: [AudioEdge; 2] =
        [AudioEdge::Absent(Direction::FromNetwork), AudioEdge::Absent(Direction::ToNetwork)];

    #[test]
    fn test_active_call_edges() {
        let mut tracker = tracker_with(&[MODEM]);

        assert_eq!(tracker.apply(added(MODEM, "/call/1", CallState::Active)).unwrap(), BOTH_PRESENT);
        assert_eq!(tracker.apply(deleted(MODEM, "/call/1")).unwrap(), BOTH_ABSENT);
    }

    #[test]
    fn test_calls_on_two_modems_share_global_presence() {
        let mut tracker = tracker_with(&[MODEM, MODEM2]);

        assert_eq!(tracker.apply(added(MODEM, "/call/1", CallState::Active)).unwrap().len(), 2);
        assert!(tracker.apply(added(MODEM2, "/call/1", CallState::Active)).unwrap().is_empty());
        assert_eq!(tracker.audio_status().modems, PerDirection::new(2, 2));

        let edges = tracker.apply(changed(MODEM, "/call/1", CallState::Active, CallState::Terminated));
        assert!(edges.unwrap().is_empty());
        assert!(tracker.is_present(Direction::ToNetwork));

        let edges = tracker.apply(changed(MODEM2, "/call/1", CallState::Active, CallState::Terminated));
        assert_eq!(edges.unwrap(), BOTH_ABSENT);
    }

    #[test]
    fn test_modem_removal_releases_audio() {
        let mut tracker = tracker_with(&[MODEM]);
        tracker.apply(added(MODEM, "/call/1", CallState::RingingOut)).unwrap();

        let edges = tracker.apply(Command::ModemRemoved { modem: MODEM.into() }).unwrap();
        assert_eq!(edges, vec![AudioEdge::Absent(Direction::FromNetwork)]);
        assert_eq!(tracker.modem_count(), 0);
    }

    #[test]
    fn test_protocol_inconsistencies_are_not_fatal() {
        let mut tracker = tracker_with(&[MODEM]);

        let err = tracker.apply(Command::ModemAdded { modem: MODEM.into() }).unwrap_err();
        assert_matches!(err, Error::DuplicateModem(_));
        assert!(!err.is_fatal());

        let err = tracker.apply(added(MODEM2, "/call/1", CallState::Active)).unwrap_err();
        assert_matches!(err, Error::ModemNotFound(_));

        let err = tracker.apply(deleted(MODEM, "/call/9")).unwrap_err();
        assert_matches!(err, Error::CallNotFound { .. });
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_calls_listed_seeds_modem() {
        let mut tracker = tracker_with(&[MODEM]);
        let edges = tracker
            .apply(Command::CallsListed {
                modem: MODEM.into(),
                calls: vec![
                    CallInfo::new("/call/1", CallState::Held),
                    CallInfo::new("/call/2", CallState::Active),
                ],
            })
            .unwrap();

        assert_eq!(edges, BOTH_PRESENT);
        assert_eq!(tracker.snapshot()[0].calls.len(), 2);
    }

    #[test]
    fn test_shutdown_clears_everything() {
        let mut tracker = tracker_with(&[MODEM, MODEM2]);
        tracker.apply(added(MODEM, "/call/1", CallState::Active)).unwrap();
        tracker.apply(added(MODEM2, "/call/1", CallState::Active)).unwrap();

        assert_eq!(tracker.apply(Command::Shutdown).unwrap(), BOTH_ABSENT);
        assert_eq!(tracker.audio_status(), AudioStatus::default());
        assert!(tracker.clear().is_empty());
    }

    #[test]
    fn test_audio_status_counts_calls() {
        let mut tracker = tracker_with(&[MODEM]);
        tracker.apply(added(MODEM, "/call/1", CallState::Active)).unwrap();
        tracker.apply(added(MODEM, "/call/2", CallState::RingingOut)).unwrap();

        let status = tracker.audio_status();
        assert_eq!(status.present, PerDirection::new(true, true));
        assert_eq!(status.modems, PerDirection::new(1, 1));
        assert_eq!(status.calls, PerDirection::new(2, 1));
    }

    fn any_state() -> impl Strategy<Value = CallState> {
        prop_oneof![
            Just(CallState::Unknown),
            Just(CallState::Dialing),
            Just(CallState::RingingIn),
            Just(CallState::RingingOut),
            Just(CallState::Active),
            Just(CallState::Held),
            Just(CallState::Terminated),
        ]
    }

    fn any_command() -> impl Strategy<Value = Command> {
        let modem = prop_oneof![Just(MODEM), Just(MODEM2)];
        let call = (0..3u8).prop_map(|c| format!("/call/{c}"));
        prop_oneof![
            modem.clone().prop_map(|m| Command::ModemAdded { modem: m.into() }),
            modem.clone().prop_map(|m| Command::ModemRemoved { modem: m.into() }),
            (modem.clone(), call.clone(), any_state()).prop_map(|(m, c, s)| added(m, &c, s)),
            (modem.clone(), call.clone()).prop_map(|(m, c)| deleted(m, &c)),
            (modem, call, any_state(), any_state()).prop_map(|(m, c, o, n)| changed(m, &c, o, n)),
        ]
    }

    proptest! {
        #[test]
        fn prop_global_edges_alternate(commands in proptest::collection::vec(any_command(), 0..96)) {
            let mut tracker = CallAudioTracker::new();
            let mut present = PerDirection::new(false, false);

            for command in commands {
                match tracker.apply(command) {
                    Ok(edges) => {
                        for edge in edges {
                            let slot = present.get_mut(edge.direction());
                            // Present and absent must strictly alternate per direction
                            prop_assert_ne!(*slot, edge.is_present());
                            *slot = edge.is_present();
                        }
                    }
                    Err(e) => prop_assert!(!e.is_fatal(), "invariant violated: {e}"),
                }

                for direction in Direction::ALL {
                    let status = tracker.audio_status();
                    let modems_with_audio = tracker
                        .snapshot()
                        .iter()
                        .filter(|m| *m.audio_count.get(direction) > 0)
                        .count();
                    prop_assert_eq!(*status.modems.get(direction) as usize, modems_with_audio);
                    prop_assert_eq!(*present.get(direction), tracker.is_present(direction));
                }
            }

            tracker.clear();
        }
    }
}
