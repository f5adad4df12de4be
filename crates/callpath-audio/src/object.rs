//! Audio server objects.
//!
//! A plain view of the parts of the server's object graph that loopback
//! discovery walks: endpoints (sources and sinks), the streams attached to
//! them and the modules that own those streams.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Property list of an audio server object.
pub type Properties = BTreeMap<String, String>;

/// Name of the server module implementing a loopback path.
pub const LOOPBACK_MODULE: &str = "module-loopback";

/// Kinds of audio server objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Source,
    Sink,
    SourceOutput,
    SinkInput,
    Module,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Sink => "sink",
            Self::SourceOutput => "source output",
            Self::SinkInput => "sink input",
            Self::Module => "module",
        })
    }
}

/// A source or sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    /// Server object index
    pub index: u32,
    /// Object name, as used in module arguments
    pub name: String,
    /// All object properties
    pub properties: Properties,
}

/// A stream consuming from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOutputInfo {
    pub index: u32,
    /// Module that created this stream, if any
    pub owner_module: Option<u32>,
    /// Index of the source being consumed
    pub source: u32,
    pub properties: Properties,
}

/// A stream playing into a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkInputInfo {
    pub index: u32,
    /// Module that created this stream, if any
    pub owner_module: Option<u32>,
    /// Index of the target sink
    pub sink: u32,
    pub properties: Properties,
}

/// A loaded server module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub index: u32,
    /// Module type, e.g. `module-loopback`
    pub name: String,
    pub argument: Option<String>,
}

impl ModuleInfo {
    #[must_use]
    pub fn is_loopback(&self) -> bool {
        self.name == LOOPBACK_MODULE
    }
}
