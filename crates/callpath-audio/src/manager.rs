//! Path manager backends.
//!
//! A [`PathManager`] turns a direction into a loopback between the codec
//! and modem cards. The server-module backend lives here; the helper
//! process backend is in [`crate::process`].

use std::sync::Arc;

use async_trait::async_trait;
use callpath_core::Direction;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AudioResult;
use crate::provision::{ensure_loopback, ensure_no_loopback};
use crate::server::AudioServer;

/// Provisions and tears down the audio path for one direction.
///
/// Both operations are safe to call redundantly.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PathManager: Send + Sync {
    /// Backend name, for status reporting.
    fn name(&self) -> &'static str;

    /// Make sure the path for `direction` exists.
    async fn ensure_path(&self, direction: Direction) -> AudioResult<()>;

    /// Make sure no path for `direction` exists.
    async fn ensure_no_path(&self, direction: Direction) -> AudioResult<()>;
}

/// The two hardware cards a call is routed between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPair {
    /// Speaker/microphone codec card
    pub codec: String,
    /// Modem audio interface card
    pub modem: String,
}

/// Source card, sink card and user-visible label of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub label: &'static str,
}

impl CardPair {
    #[must_use]
    pub fn new(codec: impl Into<String>, modem: impl Into<String>) -> Self {
        Self { codec: codec.into(), modem: modem.into() }
    }

    /// The route carrying audio in `direction`.
    #[must_use]
    pub fn route(&self, direction: Direction) -> Route<'_> {
        match direction {
            Direction::FromNetwork => Route {
                from: &self.modem,
                to: &self.codec,
                label: "Voice call audio (to speaker)",
            },
            Direction::ToNetwork => Route {
                from: &self.codec,
                to: &self.modem,
                label: "Voice call audio (from mic)",
            },
        }
    }
}

/// Loopback paths as `module-loopback` instances on the audio server.
pub struct ModuleLoopback<S: AudioServer + ?Sized> {
    server: Arc<S>,
    cards: CardPair,
}

impl<S: AudioServer + ?Sized> ModuleLoopback<S> {
    #[must_use]
    pub fn new(server: Arc<S>, cards: CardPair) -> Self {
        Self { server, cards }
    }
}

#[async_trait]
impl<S: AudioServer + ?Sized> PathManager for ModuleLoopback<S> {
    fn name(&self) -> &'static str {
        "module"
    }

    async fn ensure_path(&self, direction: Direction) -> AudioResult<()> {
        let route = self.cards.route(direction);
        info!(%direction, from = route.from, to = route.to, "Ensuring loopback");

        ensure_loopback(&*self.server, route.from, route.to, route.label).await?;
        Ok(())
    }

    async fn ensure_no_path(&self, direction: Direction) -> AudioResult<()> {
        let route = self.cards.route(direction);
        info!(%direction, from = route.from, to = route.to, "Ensuring no loopback");

        let outcome = ensure_no_loopback(&*self.server, route.from, route.to).await?;
        if !outcome.failed.is_empty() {
            warn!(%direction, failed = outcome.failed.len(), "Loopback teardown incomplete");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeServer;

    const CODEC: &str = "sgtl5000";
    const MODEM: &str = "SIMcom SIM7100";

    #[test]
    fn test_routes() {
        let cards = CardPair::new(CODEC, MODEM);

        let down = cards.route(Direction::FromNetwork);
        assert_eq!((down.from, down.to), (MODEM, CODEC));
        assert_eq!(down.label, "Voice call audio (to speaker)");

        let up = cards.route(Direction::ToNetwork);
        assert_eq!((up.from, up.to), (CODEC, MODEM));
        assert_eq!(up.label, "Voice call audio (from mic)");
    }

    #[tokio::test]
    async fn test_module_loopback_per_direction() {
        let server = Arc::new(FakeServer::new());
        server.add_card(CODEC);
        server.add_card(MODEM);
        let manager = ModuleLoopback::new(Arc::clone(&server), CardPair::new(CODEC, MODEM));

        manager.ensure_path(Direction::FromNetwork).await.unwrap();
        manager.ensure_path(Direction::ToNetwork).await.unwrap();
        manager.ensure_path(Direction::ToNetwork).await.unwrap();
        assert_eq!(server.loopbacks().len(), 2);

        manager.ensure_no_path(Direction::FromNetwork).await.unwrap();
        assert_eq!(server.loopbacks().len(), 1);
        manager.ensure_no_path(Direction::FromNetwork).await.unwrap();
        manager.ensure_no_path(Direction::ToNetwork).await.unwrap();
        assert!(server.loopbacks().is_empty());
    }

    #[tokio::test]
    async fn test_missing_card_is_error() {
        let server = Arc::new(FakeServer::new());
        server.add_card(CODEC);
        let manager = ModuleLoopback::new(server, CardPair::new(CODEC, MODEM));

        assert!(manager.ensure_path(Direction::FromNetwork).await.is_err());
    }
}
