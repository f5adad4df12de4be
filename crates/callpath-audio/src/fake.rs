//! In-memory audio server for tests.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{AudioError, AudioResult};
use crate::matcher::{ALSA_CARD_NAME, DEVICE_API, DEVICE_CLASS};
use crate::object::{EndpointInfo, ModuleInfo, ObjectKind, Properties, SinkInputInfo, SourceOutputInfo};
use crate::server::AudioServer;

#[derive(Debug, Default)]
struct Graph {
    next_index: u32,
    sources: Vec<EndpointInfo>,
    sinks: Vec<EndpointInfo>,
    modules: BTreeMap<u32, ModuleInfo>,
    source_outputs: Vec<SourceOutputInfo>,
    sink_inputs: Vec<SinkInputInfo>,
    /// Modules that vanish from lookups while their streams remain
    hidden_modules: BTreeSet<u32>,
    load_error: Option<String>,
    unload_error: Option<String>,
    loads: usize,
}

impl Graph {
    fn next(&mut self) -> u32 {
        self.next_index += 1;
        self.next_index
    }
}

/// Fake audio server holding a mutable object graph.
#[derive(Debug, Default)]
pub(crate) struct FakeServer {
    graph: Mutex<Graph>,
}

pub(crate) fn card_properties(card: &str) -> Properties {
    [(DEVICE_CLASS, "sound"), (DEVICE_API, "alsa"), (ALSA_CARD_NAME, card)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl FakeServer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a source and a sink for a hardware card.
    ///
    /// Endpoint names are `alsa_input.<card>` and `alsa_output.<card>` with
    /// spaces replaced by underscores.
    pub(crate) fn add_card(&self, card: &str) -> (u32, u32) {
        let id = card.replace(' ', "_");
        let mut graph = self.graph.lock();
        let source = graph.next();
        graph.sources.push(EndpointInfo {
            index: source,
            name: format!("alsa_input.{id}"),
            properties: card_properties(card),
        });
        let sink = graph.next();
        graph.sinks.push(EndpointInfo {
            index: sink,
            name: format!("alsa_output.{id}"),
            properties: card_properties(card),
        });
        (source, sink)
    }

    /// Add a module with one stream on each side, as a loopback would have.
    pub(crate) fn add_module_between(&self, name: &str, source: u32, sink: u32) -> u32 {
        let mut graph = self.graph.lock();
        let module = graph.next();
        graph.modules.insert(module, ModuleInfo { index: module, name: name.to_string(), argument: None });
        let output = graph.next();
        graph.source_outputs.push(SourceOutputInfo {
            index: output,
            owner_module: Some(module),
            source,
            properties: Properties::new(),
        });
        let input = graph.next();
        graph.sink_inputs.push(SinkInputInfo {
            index: input,
            owner_module: Some(module),
            sink,
            properties: Properties::new(),
        });
        module
    }

    /// Add a client stream recording from `source`, not owned by any module.
    pub(crate) fn add_client_output(&self, source: u32) {
        let mut graph = self.graph.lock();
        let index = graph.next();
        graph.source_outputs.push(SourceOutputInfo {
            index,
            owner_module: None,
            source,
            properties: Properties::new(),
        });
    }

    pub(crate) fn hide_module(&self, index: u32) {
        self.graph.lock().hidden_modules.insert(index);
    }

    pub(crate) fn fail_loads(&self, reason: &str) {
        self.graph.lock().load_error = Some(reason.to_string());
    }

    pub(crate) fn fail_unloads(&self, reason: &str) {
        self.graph.lock().unload_error = Some(reason.to_string());
    }

    pub(crate) fn loads(&self) -> usize {
        self.graph.lock().loads
    }

    /// Indices of every loaded loopback module.
    pub(crate) fn loopbacks(&self) -> Vec<u32> {
        self.graph.lock().modules.values().filter(|m| m.is_loopback()).map(|m| m.index).collect()
    }

    pub(crate) fn module(&self, index: u32) -> Option<ModuleInfo> {
        self.graph.lock().modules.get(&index).cloned()
    }
}

fn argument_value<'a>(argument: &'a str, key: &str) -> Option<&'a str> {
    argument.split_whitespace().find_map(|w| w.strip_prefix(key)?.strip_prefix('='))
}

#[async_trait]
impl AudioServer for FakeServer {
    async fn list_source_outputs(&self) -> AudioResult<Vec<SourceOutputInfo>> {
        Ok(self.graph.lock().source_outputs.clone())
    }

    async fn list_sink_inputs(&self) -> AudioResult<Vec<SinkInputInfo>> {
        Ok(self.graph.lock().sink_inputs.clone())
    }

    async fn list_sources(&self) -> AudioResult<Vec<EndpointInfo>> {
        Ok(self.graph.lock().sources.clone())
    }

    async fn list_sinks(&self) -> AudioResult<Vec<EndpointInfo>> {
        Ok(self.graph.lock().sinks.clone())
    }

    async fn get_source(&self, index: u32) -> AudioResult<EndpointInfo> {
        let graph = self.graph.lock();
        let source = graph.sources.iter().find(|s| s.index == index);
        source.cloned().ok_or(AudioError::ObjectNotFound { kind: ObjectKind::Source, index })
    }

    async fn get_sink(&self, index: u32) -> AudioResult<EndpointInfo> {
        let graph = self.graph.lock();
        let sink = graph.sinks.iter().find(|s| s.index == index);
        sink.cloned().ok_or(AudioError::ObjectNotFound { kind: ObjectKind::Sink, index })
    }

    async fn get_module(&self, index: u32) -> AudioResult<ModuleInfo> {
        let graph = self.graph.lock();
        if graph.hidden_modules.contains(&index) {
            return Err(AudioError::ObjectNotFound { kind: ObjectKind::Module, index });
        }
        let module = graph.modules.get(&index).cloned();
        module.ok_or(AudioError::ObjectNotFound { kind: ObjectKind::Module, index })
    }

    async fn load_module(&self, name: &str, argument: &str) -> AudioResult<u32> {
        let (source, sink) = {
            let mut graph = self.graph.lock();
            if let Some(reason) = &graph.load_error {
                return Err(AudioError::LoadFailed(reason.clone()));
            }
            graph.loads += 1;

            let by_name = |endpoints: &[EndpointInfo], key: &str| {
                let wanted = argument_value(argument, key)?;
                endpoints.iter().find(|e| e.name == wanted).map(|e| e.index)
            };
            let source = by_name(&graph.sources, "source");
            let sink = by_name(&graph.sinks, "sink");
            match (source, sink) {
                (Some(source), Some(sink)) => (source, sink),
                _ => return Err(AudioError::LoadFailed(format!("bad arguments: {argument}"))),
            }
        };

        let index = self.add_module_between(name, source, sink);
        if let Some(module) = self.graph.lock().modules.get_mut(&index) {
            module.argument = Some(argument.to_string());
        }
        Ok(index)
    }

    async fn unload_module(&self, index: u32) -> AudioResult<()> {
        let mut graph = self.graph.lock();
        if let Some(reason) = &graph.unload_error {
            return Err(AudioError::UnloadFailed { index, reason: reason.clone() });
        }
        if graph.modules.remove(&index).is_none() {
            return Err(AudioError::UnloadFailed { index, reason: "no such module".into() });
        }
        graph.source_outputs.retain(|o| o.owner_module != Some(index));
        graph.sink_inputs.retain(|i| i.owner_module != Some(index));
        Ok(())
    }
}

