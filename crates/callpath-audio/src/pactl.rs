//! Audio server access through the `pactl` command line tool.
//!
//! Works against PulseAudio and against PipeWire's pulse server. Object
//! lists are read with `pactl --format=json`; modules are read from the
//! short listing since their JSON form lacks indices on older servers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{AudioError, AudioResult};
use crate::object::{EndpointInfo, ModuleInfo, ObjectKind, Properties, SinkInputInfo, SourceOutputInfo};
use crate::server::AudioServer;

/// `pactl`-backed audio server.
#[derive(Debug, Clone)]
pub struct Pactl {
    program: String,
}

impl Pactl {
    /// Create a backend without checking that the server is reachable.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Create a backend and verify the server answers.
    ///
    /// # Errors
    /// Returns an error if `pactl info` cannot be run or fails.
    pub async fn connect(program: impl Into<String>) -> AudioResult<Self> {
        let pactl = Self::new(program);
        let output = pactl.run(&["info"]).await?;

        let server = output
            .lines()
            .find_map(|l| l.strip_prefix("Server Name:"))
            .map_or("unknown", str::trim);
        info!(program = %pactl.program, %server, "Connected to audio server");

        Ok(pactl)
    }

    async fn run(&self, args: &[&str]) -> AudioResult<String> {
        debug!(program = %self.program, ?args, "Running audio server command");

        let output = Command::new(&self.program).args(args).env("LC_ALL", "C").output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AudioError::CommandFailed(format!(
                "{} {}: {}",
                self.program,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn list_json<T: DeserializeOwned>(&self, kind: &str) -> AudioResult<T> {
        let output = self.run(&["--format=json", "list", kind]).await?;
        Ok(serde_json::from_str(&output)?)
    }

    async fn get_endpoint(&self, kind: ObjectKind, index: u32) -> AudioResult<EndpointInfo> {
        let endpoints = match kind {
            ObjectKind::Sink => self.list_sinks().await?,
            _ => self.list_sources().await?,
        };
        endpoints
            .into_iter()
            .find(|e| e.index == index)
            .ok_or(AudioError::ObjectNotFound { kind, index })
    }
}

#[async_trait]
impl AudioServer for Pactl {
    async fn list_source_outputs(&self) -> AudioResult<Vec<SourceOutputInfo>> {
        Ok(parse_source_outputs(self.list_json("source-outputs").await?))
    }

    async fn list_sink_inputs(&self) -> AudioResult<Vec<SinkInputInfo>> {
        Ok(parse_sink_inputs(self.list_json("sink-inputs").await?))
    }

    async fn list_sources(&self) -> AudioResult<Vec<EndpointInfo>> {
        Ok(parse_endpoints(self.list_json("sources").await?))
    }

    async fn list_sinks(&self) -> AudioResult<Vec<EndpointInfo>> {
        Ok(parse_endpoints(self.list_json("sinks").await?))
    }

    async fn get_source(&self, index: u32) -> AudioResult<EndpointInfo> {
        self.get_endpoint(ObjectKind::Source, index).await
    }

    async fn get_sink(&self, index: u32) -> AudioResult<EndpointInfo> {
        self.get_endpoint(ObjectKind::Sink, index).await
    }

    async fn get_module(&self, index: u32) -> AudioResult<ModuleInfo> {
        let output = self.run(&["list", "short", "modules"]).await?;
        parse_modules(&output)
            .into_iter()
            .find(|m| m.index == index)
            .ok_or(AudioError::ObjectNotFound { kind: ObjectKind::Module, index })
    }

    async fn load_module(&self, name: &str, argument: &str) -> AudioResult<u32> {
        let output = self.run(&["load-module", name, argument]).await.map_err(|e| match e {
            AudioError::CommandFailed(reason) => AudioError::LoadFailed(reason),
            e => e,
        })?;
        output
            .trim()
            .parse()
            .map_err(|_| AudioError::Parse(format!("load-module printed `{}`", output.trim())))
    }

    async fn unload_module(&self, index: u32) -> AudioResult<()> {
        self.run(&["unload-module", &index.to_string()]).await.map_err(|e| match e {
            AudioError::CommandFailed(reason) => AudioError::UnloadFailed { index, reason },
            e => e,
        })?;
        Ok(())
    }
}

/// An object as printed by `pactl --format=json list`.
#[derive(Debug, Deserialize)]
struct RawObject {
    #[serde(default, deserialize_with = "lenient_index")]
    index: Option<u32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_index")]
    owner_module: Option<u32>,
    #[serde(default, deserialize_with = "lenient_index")]
    source: Option<u32>,
    #[serde(default, deserialize_with = "lenient_index")]
    sink: Option<u32>,
    #[serde(default)]
    properties: BTreeMap<String, Value>,
}

impl RawObject {
    fn properties(&self) -> Properties {
        self.properties
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), v)
            })
            .collect()
    }
}

/// Indices may be numbers, numeric strings, `"n/a"` or the invalid index.
fn lenient_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let index = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(index.filter(|i| *i != u32::MAX))
}

fn parse_endpoints(raw: Vec<RawObject>) -> Vec<EndpointInfo> {
    raw.into_iter()
        .filter_map(|o| {
            let properties = o.properties();
            Some(EndpointInfo { index: o.index?, name: o.name?, properties })
        })
        .collect()
}

fn parse_source_outputs(raw: Vec<RawObject>) -> Vec<SourceOutputInfo> {
    raw.into_iter()
        .filter_map(|o| {
            let properties = o.properties();
            Some(SourceOutputInfo {
                index: o.index?,
                owner_module: o.owner_module,
                source: o.source?,
                properties,
            })
        })
        .collect()
}

fn parse_sink_inputs(raw: Vec<RawObject>) -> Vec<SinkInputInfo> {
    raw.into_iter()
        .filter_map(|o| {
            let properties = o.properties();
            Some(SinkInputInfo { index: o.index?, owner_module: o.owner_module, sink: o.sink?, properties })
        })
        .collect()
}

/// Parse `pactl list short modules`: index, name and argument, tab separated.
fn parse_modules(output: &str) -> Vec<ModuleInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let index = fields.next()?.trim().parse().ok()?;
            let name = fields.next()?.trim().to_string();
            let argument = fields.next().map(str::trim).filter(|a| !a.is_empty()).map(str::to_string);
            Some(ModuleInfo { index, name, argument })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<T: DeserializeOwned>(json: &str) -> T {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_endpoints() {
        let json = r#"[
            {"index": 1, "name": "alsa_output.platform-sound.HiFi__hw_sgtl5000__sink",
             "owner_module": 4294967295,
             "properties": {"device.class": "sound", "device.api": "alsa", "alsa.card_name": "sgtl5000",
                            "alsa.card": 0}},
            {"name": "nameless-without-index", "properties": {}}
        ]"#;
        let endpoints = parse_endpoints(parse(json));

        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].index, 1);
        assert_eq!(endpoints[0].properties["alsa.card_name"], "sgtl5000");
        assert_eq!(endpoints[0].properties["alsa.card"], "0");
    }

    #[test]
    fn test_parse_streams_with_lenient_owner() {
        let json = r#"[
            {"index": 7, "owner_module": "23", "source": 2, "properties": {}},
            {"index": 8, "owner_module": "n/a", "source": 2, "properties": {}},
            {"index": 9, "owner_module": null, "source": 3}
        ]"#;
        let outputs = parse_source_outputs(parse(json));

        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0].owner_module, Some(23));
        assert_eq!(outputs[1].owner_module, None);
        assert_eq!(outputs[2].owner_module, None);

        let inputs = parse_sink_inputs(parse(r#"[{"index": 4, "owner_module": 23, "sink": 1}]"#));
        assert_eq!(inputs[0].sink, 1);
        assert_eq!(inputs[0].owner_module, Some(23));
    }

    #[test]
    fn test_parse_short_modules() {
        let output = "0\tmodule-device-restore\t\t\n\
                      23\tmodule-loopback\tsource=a sink=b source_dont_move=true\t\n\
                      garbage line\n";
        let modules = parse_modules(output);

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].argument, None);
        assert!(modules[1].is_loopback());
        assert_eq!(modules[1].argument.as_deref(), Some("source=a sink=b source_dont_move=true"));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let pactl = Pactl::new("/nonexistent/callpath-pactl");
        assert!(matches!(pactl.list_sources().await, Err(AudioError::Io(_))));
    }
}
