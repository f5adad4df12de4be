//! Loopback path provisioning and teardown.

use std::collections::BTreeSet;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::discovery::find_paths;
use crate::error::{AudioError, AudioResult};
use crate::matcher::matches_card;
use crate::object::{EndpointInfo, LOOPBACK_MODULE, ObjectKind};
use crate::server::AudioServer;

/// Result of [`ensure_loopback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// A new loopback module was loaded
    Created(u32),
    /// Loopback paths already existed; nothing was loaded
    AlreadyPresent(BTreeSet<u32>),
}

/// Result of [`ensure_no_loopback`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownOutcome {
    /// Modules unloaded
    pub removed: Vec<u32>,
    /// Modules that could not be unloaded, with the reason
    pub failed: Vec<(u32, String)>,
}

impl TeardownOutcome {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.failed.is_empty()
    }
}

/// Resolve a card name to the first matching source or sink.
///
/// # Errors
/// Returns [`AudioError::EndpointNotFound`] if no endpoint of `kind` belongs
/// to `card`, or the server error if the listing fails.
pub async fn find_endpoint<S>(server: &S, kind: ObjectKind, card: &str) -> AudioResult<EndpointInfo>
where
    S: AudioServer + ?Sized,
{
    let endpoints = match kind {
        ObjectKind::Sink => server.list_sinks().await?,
        _ => server.list_sources().await?,
    };

    endpoints
        .into_iter()
        .find(|e| matches_card(&e.properties, card))
        .ok_or_else(|| AudioError::EndpointNotFound { kind, card: card.to_string() })
}

/// Escape a value for a double-quoted property inside a single-quoted
/// module argument.
fn escape_property(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '\'') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Stream properties tagging both ends of a loopback path.
#[must_use]
pub fn loopback_properties(label: &str) -> String {
    format!(r#"media.role="phone" media.icon_name="phone" media.name="{}""#, escape_property(label))
}

/// Module argument for a loopback between two endpoints.
#[must_use]
pub fn loopback_arguments(source: &str, sink: &str, label: &str) -> String {
    let props = loopback_properties(label);
    format!(
        "source={source} sink={sink} source_dont_move=true sink_dont_move=true \
         sink_input_properties='{props}' source_output_properties='{props}'"
    )
}

/// Load a loopback module from card `from` to card `to` unconditionally.
///
/// # Errors
/// Returns an error if either card has no endpoint or the load is rejected.
pub async fn provision_loopback<S>(server: &S, from: &str, to: &str, label: &str) -> AudioResult<u32>
where
    S: AudioServer + ?Sized,
{
    let source = find_endpoint(server, ObjectKind::Source, from).await?;
    debug!(card = from, source = %source.name, "Resolved loopback source");

    let sink = find_endpoint(server, ObjectKind::Sink, to).await?;
    debug!(card = to, sink = %sink.name, "Resolved loopback sink");

    let argument = loopback_arguments(&source.name, &sink.name, label);
    server.load_module(LOOPBACK_MODULE, &argument).await
}

/// Make sure a loopback path from card `from` to card `to` exists.
///
/// Existing paths are discovered first and left alone.
///
/// # Errors
/// Returns an error if discovery, endpoint resolution or the load fails.
pub async fn ensure_loopback<S>(
    server: &S,
    from: &str,
    to: &str,
    label: &str,
) -> AudioResult<ProvisionOutcome>
where
    S: AudioServer + ?Sized,
{
    let found = find_paths(server, from, to).await?;
    if !found.is_empty() {
        warn!(from, to, modules = ?found.modules, "Loopback already exists");
        return Ok(ProvisionOutcome::AlreadyPresent(found.modules));
    }

    let module = provision_loopback(server, from, to, label).await?;
    info!(from, to, module, %label, "Loopback created");

    match find_paths(server, from, to).await {
        Ok(found) if found.len() > 1 => {
            warn!(from, to, modules = ?found.modules, "Duplicate loopback paths after provisioning");
        }
        Ok(_) => {}
        Err(e) => debug!(error = %e, "Could not verify loopback after provisioning"),
    }

    Ok(ProvisionOutcome::Created(module))
}

/// Remove every loopback path from card `from` to card `to`.
///
/// Finding nothing to remove is not an error. Unload failures are logged
/// and reported in the outcome.
///
/// # Errors
/// Returns an error only if discovery fails.
pub async fn ensure_no_loopback<S>(server: &S, from: &str, to: &str) -> AudioResult<TeardownOutcome>
where
    S: AudioServer + ?Sized,
{
    let found = find_paths(server, from, to).await?;
    if found.is_empty() {
        warn!(from, to, "No loopback to tear down");
        return Ok(TeardownOutcome::default());
    }

    let unloads = found.modules.iter().map(|&module| async move {
        (module, server.unload_module(module).await)
    });

    let mut outcome = TeardownOutcome::default();
    for (module, result) in join_all(unloads).await {
        match result {
            Ok(()) => {
                info!(from, to, module, "Loopback removed");
                outcome.removed.push(module);
            }
            Err(e) => {
                warn!(from, to, module, error = %e, "Failed to remove loopback");
                outcome.failed.push((module, e.to_string()));
            }
        }
    }

    Ok(outcome)
}
