//! Loopback paths as external helper processes.
//!
//! Each direction gets one helper process (by default `alsaloop`) copying
//! audio between the two cards directly. Tearing a path down sends the
//! helper SIGTERM and reaps it.

use std::collections::HashMap;

use async_trait::async_trait;
use callpath_core::Direction;
use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::error::{AudioError, AudioResult};
use crate::manager::{CardPair, PathManager, Route};

/// Default loopback helper binary.
pub const DEFAULT_HELPER: &str = "alsaloop";

/// Default helper arguments; `{from}` and `{to}` are replaced by card names.
#[must_use]
pub fn default_helper_args() -> Vec<String> {
    ["-C", "hw:{from}", "-P", "hw:{to}"].into_iter().map(String::from).collect()
}

/// Expand a helper argument template for a route.
#[must_use]
pub fn helper_arguments(template: &[String], route: &Route<'_>) -> Vec<String> {
    template.iter().map(|arg| arg.replace("{from}", route.from).replace("{to}", route.to)).collect()
}

/// Path manager running one helper process per direction.
pub struct ProcessLoopback {
    helper: String,
    args: Vec<String>,
    cards: CardPair,
    children: Mutex<HashMap<Direction, Child>>,
}

impl ProcessLoopback {
    #[must_use]
    pub fn new(helper: impl Into<String>, args: Vec<String>, cards: CardPair) -> Self {
        Self { helper: helper.into(), args, cards, children: Mutex::new(HashMap::new()) }
    }

    /// Whether a helper for `direction` is currently running.
    #[must_use]
    pub fn is_running(&self, direction: Direction) -> bool {
        self.children
            .lock()
            .get_mut(&direction)
            .is_some_and(|child| matches!(child.try_wait(), Ok(None)))
    }
}

#[allow(unsafe_code)]
fn terminate(child: &Child) -> AudioResult<()> {
    // No id means the child has already been reaped
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| AudioError::ProcessFailed(format!("invalid pid {pid}")))?;

    // SAFETY: kill(2) takes plain integers and has no memory preconditions
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

#[async_trait]
impl PathManager for ProcessLoopback {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn ensure_path(&self, direction: Direction) -> AudioResult<()> {
        let route = self.cards.route(direction);
        let mut children = self.children.lock();

        if let Some(child) = children.get_mut(&direction) {
            match child.try_wait() {
                Ok(None) => {
                    warn!(%direction, pid = child.id(), "Loopback helper already running");
                    return Ok(());
                }
                Ok(Some(status)) => warn!(%direction, %status, "Loopback helper exited, restarting"),
                Err(e) => warn!(%direction, error = %e, "Loopback helper state unknown, restarting"),
            }
            children.remove(&direction);
        }

        let args = helper_arguments(&self.args, &route);
        let child = Command::new(&self.helper)
            .args(&args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AudioError::ProcessFailed(format!("{}: {e}", self.helper)))?;

        info!(%direction, helper = %self.helper, ?args, pid = child.id(), "Loopback helper started");
        children.insert(direction, child);
        Ok(())
    }

    async fn ensure_no_path(&self, direction: Direction) -> AudioResult<()> {
        let Some(mut child) = self.children.lock().remove(&direction) else {
            warn!(%direction, "No loopback helper to stop");
            return Ok(());
        };

        terminate(&child)?;
        let status = child.wait().await?;
        info!(%direction, %status, "Loopback helper stopped");
        Ok(())
    }
}
