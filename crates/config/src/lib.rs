pub mod schema;
pub mod watcher;

pub use schema::{EngineConfig, OutputConfig, OutputFormat, TargetConfig, TransportConfig, WatchConfig};
pub use watcher::ConfigWatcher;

use pingwatch_core::{Result, WatchError};
use std::path::{Path, PathBuf};

/// Load and validate configuration from a TOML file.  Returns
/// `WatchConfig::default()` if the file doesn't exist so the monitor always
/// has something to watch.
pub fn load(path: impl AsRef<Path>) -> Result<WatchConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(WatchConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| WatchError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse and validate a TOML document.
pub fn parse(raw: &str) -> Result<WatchConfig> {
    let config: WatchConfig =
        toml::from_str(raw).map_err(|e| WatchError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("pingwatch").join("pingwatch.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load("/definitely/not/here/pingwatch.toml").unwrap();
        assert_eq!(cfg.targets.len(), 1);
    }

    #[test]
    fn parse_reports_invalid_host() {
        let err = parse("[[targets]]\nhost = \"not a host\"\n").unwrap_err();
        assert!(matches!(err, WatchError::Config(_)));
    }

    #[test]
    fn parse_reports_syntax_errors() {
        assert!(matches!(parse("[engine"), Err(WatchError::Config(_))));
    }

    #[test]
    fn default_path_ends_with_file_name() {
        assert!(default_path().ends_with("pingwatch/pingwatch.toml"));
    }
}
