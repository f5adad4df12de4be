//! Logging setup.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "callpath=info,callpath_daemon=debug,callpath_audio=debug";

/// Initialize the global subscriber.
///
/// The configured level and the crate defaults come first so that
/// `RUST_LOG` overrides them target by target.
pub fn init(log_level: &str) -> Result<()> {
    let directives = filter_directives(log_level, std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    let filter = EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter `{directives}`"))?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn filter_directives(log_level: &str, rust_log: Option<&str>) -> String {
    let mut directives = format!("{log_level},{DEFAULT_DIRECTIVES}");
    if let Some(env) = rust_log.map(str::trim).filter(|env| !env.is_empty()) {
        directives.push(',');
        directives.push_str(env);
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only() {
        assert_eq!(
            filter_directives("warn", None),
            "warn,callpath=info,callpath_daemon=debug,callpath_audio=debug"
        );
        assert_eq!(filter_directives("info", Some("  ")), filter_directives("info", None));
    }

    #[test]
    fn test_env_comes_last() {
        let directives = filter_directives("info", Some("callpath_audio=trace"));
        assert!(directives.ends_with(",callpath_audio=trace"));
        assert!(directives.find("callpath_audio=debug") < directives.find("callpath_audio=trace"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_env_overrides_crate_default() {
        let filter = EnvFilter::try_new(filter_directives("info", Some("callpath_audio=error"))).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("callpath_audio=error"));
        assert!(!rendered.contains("callpath_audio=debug"));
    }
}
