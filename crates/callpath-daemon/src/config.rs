//! Daemon configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use callpath_audio::process::{DEFAULT_HELPER, default_helper_args};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Card names
    #[serde(default)]
    pub cards: CardsConfig,
    /// Path manager backend
    #[serde(default)]
    pub backend: BackendConfig,
    /// IPC settings
    #[serde(default)]
    pub ipc: IpcConfig,
}

/// Daemon-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Card names, used when neither the command line nor the environment set them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CardsConfig {
    /// ALSA card name of the speaker/microphone codec
    pub codec: Option<String>,
    /// ALSA card name of the modem's audio interface
    pub modem: Option<String>,
}

/// Which path manager wires the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Loopback modules loaded into the audio server
    #[default]
    Module,
    /// One external helper process per direction
    Process,
}

/// Backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    /// Audio server control binary
    #[serde(default = "default_pactl")]
    pub pactl: String,
    /// Loopback helper binary for the process backend
    #[serde(default = "default_helper")]
    pub helper: String,
    /// Helper argument template; `{from}` and `{to}` are replaced by card names
    #[serde(default = "default_helper_args")]
    pub helper_args: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            pactl: default_pactl(),
            helper: default_helper(),
            helper_args: default_helper_args(),
        }
    }
}

fn default_pactl() -> String {
    "pactl".to_string()
}

fn default_helper() -> String {
    DEFAULT_HELPER.to_string()
}

/// IPC settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IpcConfig {
    /// Socket path (optional, uses the runtime directory if not set)
    pub socket: Option<PathBuf>,
}

/// Load configuration from file or defaults.
///
/// An explicitly given path must exist; the default path may be absent.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    if explicit.is_some() || config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {config_path:?}"))?;
        Ok(config)
    } else {
        info!(?config_path, "Config file not found, using defaults");
        Ok(Config::default())
    }
}

/// Get the configuration file path.
fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "callpath", "callpath")
        .context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}
