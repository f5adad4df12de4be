//! Audio server request interface.

use async_trait::async_trait;

use crate::error::AudioResult;
use crate::object::{EndpointInfo, ModuleInfo, SinkInputInfo, SourceOutputInfo};

/// Asynchronous request/reply access to an audio server.
///
/// Every request is independent; lookups of an object that has gone away
/// fail with [`AudioError::ObjectNotFound`](crate::AudioError::ObjectNotFound).
#[async_trait]
pub trait AudioServer: Send + Sync {
    async fn list_source_outputs(&self) -> AudioResult<Vec<SourceOutputInfo>>;

    async fn list_sink_inputs(&self) -> AudioResult<Vec<SinkInputInfo>>;

    async fn list_sources(&self) -> AudioResult<Vec<EndpointInfo>>;

    async fn list_sinks(&self) -> AudioResult<Vec<EndpointInfo>>;

    async fn get_source(&self, index: u32) -> AudioResult<EndpointInfo>;

    async fn get_sink(&self, index: u32) -> AudioResult<EndpointInfo>;

    async fn get_module(&self, index: u32) -> AudioResult<ModuleInfo>;

    /// Load a module, returning its index.
    async fn load_module(&self, name: &str, argument: &str) -> AudioResult<u32>;

    async fn unload_module(&self, index: u32) -> AudioResult<()>;
}
