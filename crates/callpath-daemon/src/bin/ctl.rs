//! callpath-ctl - command-line client for the callpath daemon.
//!
//! Also serves as a minimal call-signaling bridge: every notification the
//! daemon understands can be sent from the shell.

use std::path::PathBuf;

use anyhow::{Context, Result};
use callpath_core::{CallInfo, CallState, CallStateReason};
use callpath_ipc::{IpcClient, Method};
use clap::{Parser, Subcommand};
use serde_json::Value;

/// Command-line client for the callpath daemon
#[derive(Parser, Debug)]
#[command(name = "callpath-ctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Daemon socket (defaults to the runtime directory)
    #[arg(long, global = true, value_name = "PATH")]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: CtlCommand,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum CtlCommand {
    /// Show the daemon state
    Status,
    /// Print events as they arrive (all events when none are named)
    Watch { events: Vec<String> },
    /// Report a modem's voice interface
    ModemAdd { modem: String },
    /// Report a modem going away
    ModemRemove { modem: String },
    /// Report a new call
    CallAdd {
        modem: String,
        call: String,
        #[arg(value_parser = parse_state)]
        state: CallState,
    },
    /// Report a deleted call
    CallDelete { modem: String, call: String },
    /// Report a call state change
    #[command(name = "call-state")]
    CallStateChange {
        modem: String,
        call: String,
        #[arg(value_parser = parse_state)]
        old: CallState,
        #[arg(value_parser = parse_state)]
        new: CallState,
        #[arg(value_parser = parse_reason, default_value = "unknown")]
        reason: CallStateReason,
    },
    /// Stop the daemon
    Shutdown,
}

impl CtlCommand {
    fn into_method(self) -> Method {
        match self {
            Self::Status => Method::GetState,
            Self::Watch { events } => Method::Subscribe { events },
            Self::ModemAdd { modem } => Method::ModemAdded { modem },
            Self::ModemRemove { modem } => Method::ModemRemoved { modem },
            Self::CallAdd { modem, call, state } => Method::CallAdded { modem, call: CallInfo::new(call, state) },
            Self::CallDelete { modem, call } => Method::CallDeleted { modem, call },
            Self::CallStateChange { modem, call, old, new, reason } => {
                Method::CallStateChanged { modem, call, old, new, reason }
            }
            Self::Shutdown => Method::Shutdown,
        }
    }
}

fn parse_state(s: &str) -> Result<CallState, callpath_core::Error> {
    s.parse()
}

fn parse_reason(s: &str) -> Result<CallStateReason, String> {
    serde_json::from_value(Value::String(s.replace('-', "_"))).map_err(|_| format!("unknown call state reason `{s}`"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let method = cli.command.into_method();

    let mut client = match &cli.socket {
        Some(path) => IpcClient::connect(path).await,
        None => IpcClient::connect_default().await,
    }
    .context("Failed to connect to the callpath daemon")?;

    let watching = matches!(method, Method::Subscribe { .. });
    let result = client.call(method).await?;

    if watching {
        while let Some(event) = client.events().recv().await {
            println!("{}", serde_json::to_string(&event)?);
        }
    } else if result != Value::Null {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
