//! callpath daemon - voice-call audio path service.
//!
//! Tracks call state as reported by the call-signaling bridge over IPC and
//! wires the audio path between the modem and the speaker/microphone codec
//! whenever a call carries audio in either direction.

use std::sync::Arc;

use anyhow::{Context, Result};
use callpath_audio::{CardPair, ModuleLoopback, Orchestrator, Pactl, PathManager, ProcessLoopback};
use callpath_ipc::{IpcServer, socket_path};
use clap::Parser;
use tracing::{debug, info, warn};

mod args;
mod cards;
mod config;
mod daemon;
mod logging;
mod machine;
mod server;
mod signals;

use args::Args;
use config::{BackendKind, Config};
use daemon::Daemon;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = config::load_config(args.config.as_deref())?;

    logging::init(&config.daemon.log_level)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting callpath daemon");

    // Machine check
    let dirs = machine::search_dirs();
    let machine = match machine::read_machine() {
        Ok(name) => Some(name),
        Err(e) => {
            warn!(error = %e, "Could not read machine name, continuing without machine check");
            None
        }
    };
    if let Some(name) = &machine {
        match machine::check_machine(&dirs, cards::APP, name) {
            Ok(true) => debug!(machine = %name, "Machine check passed"),
            Ok(false) => {
                info!(machine = %name, "Machine did not pass whitelist/blacklist check, exiting");
                return Ok(());
            }
            Err(e) => warn!(error = %e, "Error checking machine name against whitelist/blacklist, continuing"),
        }
    }

    let conf_machine = machine.as_deref().map(machine::conf_name);
    let cards = cards::resolve_cards(&args, &config.cards, conf_machine.as_deref(), &dirs, |var| {
        std::env::var(var).ok()
    })?;

    let manager = build_manager(&config, cards.clone()).await?;
    let orchestrator = Orchestrator::new(manager);
    info!(backend = orchestrator.backend(), "Path manager ready");

    // Start IPC server
    let socket = config.ipc.socket.clone().unwrap_or_else(socket_path);
    let (ipc_server, mut request_rx) = IpcServer::bind(&socket).await.context("Failed to start IPC server")?;
    let daemon = Daemon::new(orchestrator, cards, ipc_server.event_sender());
    let ipc_handle = tokio::spawn(async move { ipc_server.run().await });

    let mut shutdown_rx = signals::setup_signal_handlers()?;
    let outcome = daemon.run(&mut request_rx, &mut shutdown_rx).await;

    ipc_handle.abort();
    if let Err(e) = tokio::fs::remove_file(&socket).await {
        debug!(error = %e, "Could not remove IPC socket");
    }

    info!("Daemon stopped");
    outcome.context("Call audio tracking failed")
}

/// Build the configured path manager.
async fn build_manager(config: &Config, cards: CardPair) -> Result<Arc<dyn PathManager>> {
    let manager: Arc<dyn PathManager> = match config.backend.kind {
        BackendKind::Module => {
            let pactl = Pactl::connect(config.backend.pactl.clone())
                .await
                .context("Failed to connect to the audio server")?;
            Arc::new(ModuleLoopback::new(Arc::new(pactl), cards))
        }
        BackendKind::Process => Arc::new(ProcessLoopback::new(
            config.backend.helper.clone(),
            config.backend.helper_args.clone(),
            cards,
        )),
    };
    Ok(manager)
}
