//! callpath Audio - Loopback path management on the audio server.
//!
//! This crate handles everything on the audio-server side of a call:
//! - Matching audio-server objects against hardware card names
//! - Discovering loopback paths already connecting two cards
//! - Provisioning and tearing down loopback paths
//! - Dispatching audio presence edges to a path manager backend

pub mod discovery;
pub mod error;
pub mod manager;
pub mod matcher;
pub mod object;
pub mod orchestrator;
pub mod pactl;
pub mod process;
pub mod provision;
pub mod server;

#[cfg(test)]
mod fake;

pub use discovery::{FoundPaths, find_paths};
pub use error::{AudioError, AudioResult};
pub use manager::{CardPair, ModuleLoopback, PathManager, Route};
pub use matcher::matches_card;
pub use object::{EndpointInfo, ModuleInfo, ObjectKind, Properties, SinkInputInfo, SourceOutputInfo};
pub use orchestrator::Orchestrator;
pub use pactl::Pactl;
pub use process::ProcessLoopback;
pub use provision::{ProvisionOutcome, TeardownOutcome, ensure_loopback, ensure_no_loopback};
pub use server::AudioServer;
