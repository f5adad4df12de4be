//! Card name resolution.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Result, bail};
use callpath_audio::CardPair;
use tracing::info;

use crate::args::Args;
use crate::config::CardsConfig;
use crate::machine;

/// Application name used in machine configuration paths.
pub const APP: &str = "callpath";

/// Where a card name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSource {
    CommandLine,
    Environment,
    ConfigFile,
    MachineConf,
}

impl fmt::Display for CardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CommandLine => "command line",
            Self::Environment => "environment",
            Self::ConfigFile => "config file",
            Self::MachineConf => "machine configuration",
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Codec,
    Modem,
}

impl Role {
    fn key(self) -> &'static str {
        match self {
            Self::Codec => "codec",
            Self::Modem => "modem",
        }
    }

    fn env_var(self) -> &'static str {
        match self {
            Self::Codec => "CALLPATH_CODEC",
            Self::Modem => "CALLPATH_MODEM",
        }
    }
}

/// Resolve both card names.
///
/// Per card the first source that has a value wins: command line,
/// environment, config file, per-machine configuration. `machine` is the
/// machine name in its configuration-path form, if known.
pub fn resolve_cards(
    args: &Args,
    config: &CardsConfig,
    machine: Option<&str>,
    dirs: &[PathBuf],
    env: impl Fn(&str) -> Option<String>,
) -> Result<CardPair> {
    let lookup = |role: Role, cli: Option<&String>, configured: Option<&String>| -> Result<String> {
        let found = cli
            .cloned()
            .map(|v| (v, CardSource::CommandLine))
            .or_else(|| env(role.env_var()).filter(|v| !v.is_empty()).map(|v| (v, CardSource::Environment)))
            .or_else(|| configured.cloned().map(|v| (v, CardSource::ConfigFile)))
            .or_else(|| {
                machine
                    .and_then(|m| machine::machine_conf(dirs, APP, m, role.key()))
                    .map(|v| (v, CardSource::MachineConf))
            });

        match found {
            Some((name, source)) => {
                info!(card = role.key(), name, %source, "Card name resolved");
                Ok(name)
            }
            None => bail!(
                "No {key} card name; pass --{key}, set {var}, or add it to the config file or a machine configuration",
                key = role.key(),
                var = role.env_var(),
            ),
        }
    };

    let codec = lookup(Role::Codec, args.codec.as_ref(), config.codec.as_ref())?;
    let modem = lookup(Role::Modem, args.modem.as_ref(), config.modem.as_ref())?;
    Ok(CardPair::new(codec, modem))
}
