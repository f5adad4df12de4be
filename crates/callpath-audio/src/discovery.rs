//! Loopback path discovery.
//!
//! Walks the server's object graph from the consuming streams of the "from"
//! card, through their owning loopback modules, to the modules' playback
//! streams on the "to" card. Every stream owned by a module is inspected
//! concurrently; a failed lookup only drops that branch.

use std::collections::BTreeSet;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::AudioResult;
use crate::matcher::matches_card;
use crate::object::SourceOutputInfo;
use crate::server::AudioServer;

/// Loopback modules found connecting two cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundPaths {
    pub from: String,
    pub to: String,
    /// Module indices, each one a complete loopback path
    pub modules: BTreeSet<u32>,
}

impl FoundPaths {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

/// Find every loopback module routing audio from card `from` to card `to`.
///
/// Completes only once every branch has resolved. The result may be empty.
///
/// # Errors
/// Returns an error only if the initial stream enumeration fails.
pub async fn find_paths<S>(server: &S, from: &str, to: &str) -> AudioResult<FoundPaths>
where
    S: AudioServer + ?Sized,
{
    let outputs = server.list_source_outputs().await?;
    debug!(from, to, outputs = outputs.len(), "Searching for loopback paths");

    let branches = outputs
        .iter()
        .filter_map(|output| output.owner_module.map(|module| (output, module)))
        .map(|(output, module)| inspect_branch(server, output, module, from, to));

    let mut modules = BTreeSet::new();
    for result in join_all(branches).await {
        match result {
            Ok(Some(module)) => {
                modules.insert(module);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, from, to, "Loopback lookup failed"),
        }
    }

    debug!(from, to, ?modules, "Loopback search complete");
    Ok(FoundPaths { from: from.to_string(), to: to.to_string(), modules })
}

/// Follow one module-owned source output to a loopback module ending on `to`.
async fn inspect_branch<S>(
    server: &S,
    output: &SourceOutputInfo,
    module: u32,
    from: &str,
    to: &str,
) -> AudioResult<Option<u32>>
where
    S: AudioServer + ?Sized,
{
    let source = server.get_source(output.source).await?;
    if !matches_card(&source.properties, from) {
        return Ok(None);
    }

    let info = server.get_module(module).await?;
    if !info.is_loopback() {
        debug!(module, name = %info.name, "Module on source is not a loopback");
        return Ok(None);
    }

    let inputs = server.list_sink_inputs().await?;
    let sinks = inputs
        .iter()
        .filter(|input| input.owner_module == Some(module))
        .map(|input| server.get_sink(input.sink));

    let mut found = false;
    for sink in join_all(sinks).await {
        match sink {
            Ok(sink) if matches_card(&sink.properties, to) => {
                debug!(module, sink = %sink.name, "Found loopback path");
                found = true;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, module, "Loopback sink lookup failed"),
        }
    }

    Ok(found.then_some(module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeServer;
    use crate::object::LOOPBACK_MODULE;

    const CODEC: &str = "sgtl5000";
    const MODEM: &str = "SIMcom SIM7100";

    #[tokio::test]
    async fn test_finds_only_loopback_module() {
        let server = FakeServer::new();
        let (modem_source, _) = server.add_card(MODEM);
        let (_, codec_sink) = server.add_card(CODEC);

        let loopback = server.add_module_between(LOOPBACK_MODULE, modem_source, codec_sink);
        server.add_module_between("module-combine-sink", modem_source, codec_sink);
        server.add_client_output(modem_source);

        let found = find_paths(&server, MODEM, CODEC).await.unwrap();
        assert_eq!(found.modules, BTreeSet::from([loopback]));
        assert_eq!(found.from, MODEM);
        assert_eq!(found.to, CODEC);
    }

    #[tokio::test]
    async fn test_direction_matters() {
        let server = FakeServer::new();
        let (modem_source, _) = server.add_card(MODEM);
        let (_, codec_sink) = server.add_card(CODEC);
        server.add_module_between(LOOPBACK_MODULE, modem_source, codec_sink);

        let found = find_paths(&server, CODEC, MODEM).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_finds_all_duplicates() {
        let server = FakeServer::new();
        let (codec_source, _) = server.add_card(CODEC);
        let (_, modem_sink) = server.add_card(MODEM);
        let first = server.add_module_between(LOOPBACK_MODULE, codec_source, modem_sink);
        let second = server.add_module_between(LOOPBACK_MODULE, codec_source, modem_sink);

        let found = find_paths(&server, CODEC, MODEM).await.unwrap();
        assert_eq!(found.modules, BTreeSet::from([first, second]));
    }

    #[tokio::test]
    async fn test_vanished_module_drops_only_its_branch() {
        let server = FakeServer::new();
        let (modem_source, _) = server.add_card(MODEM);
        let (_, codec_sink) = server.add_card(CODEC);
        let stale = server.add_module_between(LOOPBACK_MODULE, modem_source, codec_sink);
        let live = server.add_module_between(LOOPBACK_MODULE, modem_source, codec_sink);
        server.hide_module(stale);

        let found = find_paths(&server, MODEM, CODEC).await.unwrap();
        assert_eq!(found.modules, BTreeSet::from([live]));
    }

    #[tokio::test]
    async fn test_loopback_to_other_card_is_ignored() {
        let server = FakeServer::new();
        let (modem_source, _) = server.add_card(MODEM);
        let (_, hdmi_sink) = server.add_card("HDMI");
        server.add_card(CODEC);
        server.add_module_between(LOOPBACK_MODULE, modem_source, hdmi_sink);

        assert!(find_paths(&server, MODEM, CODEC).await.unwrap().is_empty());
    }
}
