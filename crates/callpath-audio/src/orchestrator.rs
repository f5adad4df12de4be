//! Audio orchestrator.
//!
//! Dispatches global audio presence edges to a [`PathManager`]. Every edge
//! runs as its own task so the event loop never waits on the audio server;
//! tasks are never cancelled and always run to completion.

use std::sync::Arc;

use callpath_core::AudioEdge;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::manager::PathManager;

/// Turns audio presence edges into path manager calls.
pub struct Orchestrator {
    manager: Arc<dyn PathManager>,
    tasks: JoinSet<()>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(manager: Arc<dyn PathManager>) -> Self {
        Self { manager, tasks: JoinSet::new() }
    }

    /// Name of the path manager backend.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.manager.name()
    }

    /// Start provisioning or teardown for an edge.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&mut self, edge: AudioEdge) {
        let manager = Arc::clone(&self.manager);
        debug!(?edge, in_flight = self.tasks.len(), "Dispatching audio edge");

        self.tasks.spawn(async move {
            let result = match edge {
                AudioEdge::Present(direction) => manager.ensure_path(direction).await,
                AudioEdge::Absent(direction) => manager.ensure_no_path(direction).await,
            };
            if let Err(e) = result {
                warn!(
                    direction = %edge.direction(),
                    present = edge.is_present(),
                    error = %e,
                    "Audio path operation failed"
                );
            }
        });
    }

    /// Number of operations still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the next operation to finish.
    ///
    /// Returns `None` immediately when nothing is in flight.
    pub async fn next_finished(&mut self) -> Option<()> {
        match self.tasks.join_next().await? {
            Ok(()) => Some(()),
            Err(e) => {
                error!(error = %e, "Audio path task aborted");
                Some(())
            }
        }
    }

    /// Wait for every in-flight operation to finish.
    pub async fn drain(&mut self) {
        if !self.is_idle() {
            debug!(in_flight = self.tasks.len(), "Waiting for audio path operations");
        }
        while self.next_finished().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AudioError;
    use crate::manager::MockPathManager;
    use callpath_core::Direction;
    use mockall::Sequence;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_present_and_absent_edges() {
        let mut mock = MockPathManager::new();
        let mut seq = Sequence::new();
        mock.expect_ensure_path()
            .with(eq(Direction::ToNetwork))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        mock.expect_ensure_no_path()
            .with(eq(Direction::ToNetwork))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut orchestrator = Orchestrator::new(Arc::new(mock));
        orchestrator.dispatch(AudioEdge::Present(Direction::ToNetwork));
        orchestrator.drain().await;
        orchestrator.dispatch(AudioEdge::Absent(Direction::ToNetwork));
        orchestrator.drain().await;

        assert!(orchestrator.is_idle());
    }

    #[tokio::test]
    async fn test_failures_are_contained() {
        let mut mock = MockPathManager::new();
        mock.expect_ensure_path()
            .times(2)
            .returning(|_| Err(AudioError::LoadFailed("no such card".into())));

        let mut orchestrator = Orchestrator::new(Arc::new(mock));
        orchestrator.dispatch(AudioEdge::Present(Direction::FromNetwork));
        orchestrator.dispatch(AudioEdge::Present(Direction::ToNetwork));
        assert_eq!(orchestrator.in_flight(), 2);

        orchestrator.drain().await;
        assert!(orchestrator.next_finished().await.is_none());
    }

    #[tokio::test]
    async fn test_backend_name() {
        let mut mock = MockPathManager::new();
        mock.expect_name().return_const("module");

        assert_eq!(Orchestrator::new(Arc::new(mock)).backend(), "module");
    }
}
