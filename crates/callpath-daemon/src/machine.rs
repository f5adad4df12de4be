//! Machine identity: whitelist/blacklist check and per-machine card names.
//!
//! Both lookups walk the same ordered list of configuration directories.
//! The machine check reads `<dir>/machine-check/<app>/{blacklist,whitelist}`,
//! the machine configuration reads `<dir>/<app>/machine-conf/<machine>/<key>`.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::{debug, warn};

/// Where the kernel exposes the board model.
pub const MODEL_FILE: &str = "/proc/device-tree/model";

/// Read the machine name from the device tree.
pub fn read_machine() -> io::Result<String> {
    read_machine_from(Path::new(MODEL_FILE))
}

/// Read a machine name, trimming the trailing NUL and whitespace.
pub fn read_machine_from(path: &Path) -> io::Result<String> {
    let raw = fs::read(path)?;
    let name = String::from_utf8_lossy(&raw);
    let name = name.trim_end_matches('\0').trim();
    if name.is_empty() {
        return Err(io::Error::new(ErrorKind::InvalidData, "empty machine name"));
    }
    Ok(name.to_string())
}

/// Name of a machine as used in machine configuration paths.
#[must_use]
pub fn conf_name(machine: &str) -> String {
    machine.replace('/', "_")
}

/// Configuration directories to search, most specific first.
#[must_use]
pub fn search_dirs() -> Vec<PathBuf> {
    let user = BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf());
    search_dirs_from(user, |var| std::env::var(var).ok())
}

fn search_dirs_from(user_config: Option<PathBuf>, env: impl Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    let split = |var: &str, default: &str| -> Vec<PathBuf> {
        let value = env(var).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string());
        value.split(':').filter(|p| !p.is_empty()).map(PathBuf::from).collect()
    };

    let mut dirs: Vec<PathBuf> = user_config.into_iter().collect();
    dirs.extend(split("XDG_CONFIG_DIRS", "/etc/xdg"));
    dirs.push(PathBuf::from("/etc"));
    dirs.push(PathBuf::from("/usr/share"));
    dirs.extend(split("XDG_DATA_DIRS", "/usr/local/share:/usr/share"));
    dirs
}

/// Check the machine against the blacklists and whitelists for `app`.
///
/// The first directory holding a decisive list wins: a blacklist naming the
/// machine fails the check, otherwise a whitelist passes it only if it names
/// the machine. Without any decisive list the check passes.
pub fn check_machine(dirs: &[PathBuf], app: &str, machine: &str) -> io::Result<bool> {
    for dir in dirs {
        let lists = dir.join("machine-check").join(app);

        if list_contains(&lists.join("blacklist"), machine)? == Some(true) {
            debug!(?lists, machine, "Machine is blacklisted");
            return Ok(false);
        }

        if let Some(listed) = list_contains(&lists.join("whitelist"), machine)? {
            debug!(?lists, machine, listed, "Whitelist found");
            return Ok(listed);
        }
    }

    Ok(true)
}

/// Whether a machine list names the machine; `None` when the list does not exist.
fn list_contains(path: &Path, machine: &str) -> io::Result<Option<bool>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    Ok(Some(entries(&content).any(|line| line == machine)))
}

/// Look up a per-machine configuration value for `app`.
///
/// `machine` is expected in its [`conf_name`] form.
#[must_use]
pub fn machine_conf(dirs: &[PathBuf], app: &str, machine: &str, key: &str) -> Option<String> {
    for dir in dirs {
        let path = dir.join(app).join("machine-conf").join(machine).join(key);
        match fs::read_to_string(&path) {
            Ok(content) => {
                if let Some(value) = entries(&content).next() {
                    debug!(?path, value, "Machine configuration value found");
                    return Some(value.to_string());
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(?path, error = %e, "Could not read machine configuration file"),
        }
    }

    None
}

/// Meaningful lines of a list or configuration file.
fn entries(content: &str) -> impl Iterator<Item = &str> {
    content.lines().map(str::trim).filter(|line| !line.is_empty() && !line.starts_with('#'))
}
