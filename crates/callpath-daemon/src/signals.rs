//! Signal handling for graceful shutdown.

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Set up signal handlers.
///
/// Returns a receiver that will receive a message when SIGTERM arrives.
/// SIGHUP, SIGINT and SIGPIPE are consumed and ignored, so only an explicit
/// terminate stops the daemon.
pub fn setup_signal_handlers() -> Result<mpsc::Receiver<()>> {
    let (tx, rx) = mpsc::channel(1);

    let mut term = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    tokio::spawn(async move {
        if term.recv().await.is_some() {
            info!("Received SIGTERM");
            let _ = tx.send(()).await;
        }
    });

    for (name, kind) in [
        ("SIGHUP", SignalKind::hangup()),
        ("SIGINT", SignalKind::interrupt()),
        ("SIGPIPE", SignalKind::pipe()),
    ] {
        let mut stream = signal(kind).with_context(|| format!("Failed to install {name} handler"))?;
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                debug!(signal = name, "Ignoring signal");
            }
        });
    }

    Ok(rx)
}
