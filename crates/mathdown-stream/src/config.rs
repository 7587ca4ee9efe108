//! Runtime configuration.
//!
//! Loaded from a TOML file when one is supplied; every field has a
//! compiled-in default, so an absent file or key is never an error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use mathdown_core::math::default_macros;

const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Scheduler tuning for live turns.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Quiet period after the last chunk before a non-final pass runs.
    ///
    /// A tuning constant, not a contract: bursty token arrival is coalesced
    /// into at most one pass per quiet period.
    pub debounce: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// On-disk configuration (TOML).
///
/// ```toml
/// debounce_ms = 100
///
/// [macros]
/// "\\vec" = "\\overrightarrow{#1}"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debounce_ms: u64,
    /// Macro table handed to the typesetting engine.
    pub macros: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            macros: default_macros(),
        }
    }
}

impl Config {
    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn stream(&self) -> StreamConfig {
        StreamConfig {
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.debounce_ms, 100);
        assert!(config.macros.contains_key("\\vec"));
        assert_eq!(config.stream().debounce, Duration::from_millis(100));
    }

    #[test]
    fn test_partial_file_keeps_remaining_defaults() {
        let config: Config = toml::from_str("debounce_ms = 25").unwrap();
        assert_eq!(config.debounce_ms, 25);
        assert!(config.macros.contains_key("\\vec"), "macros default lost");
    }

    #[test]
    fn test_macro_table_overrides() {
        let config: Config = toml::from_str(
            "[macros]\n\"\\\\half\" = \"\\\\frac{1}{2}\"\n",
        )
        .unwrap();
        assert_eq!(config.macros.get("\\half").map(String::as_str), Some("\\frac{1}{2}"));
        assert_eq!(config.debounce_ms, 100);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = std::env::temp_dir();
        let path = dir.join("mathdown-bad-config-test.toml");
        std::fs::write(&path, "debounce_ms = \"soon\"").unwrap();
        assert!(Config::load(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
