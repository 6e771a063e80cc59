// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.
//!
//! Stored as RON, the same way editor project settings are.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Title of the node `execute_graph` starts from by default
pub const DEFAULT_START_EVENT: &str = "On Start";

/// Title of the node `execute_tick` starts from by default
pub const DEFAULT_TICK_EVENT: &str = "On Tick";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for [`EngineConfig`]
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serializing failed
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Tunables for propagation and execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Title of the entry node for `execute_graph`
    pub start_event: String,
    /// Title of the entry node for `execute_tick`
    pub tick_event: String,
    /// Refresh every data connection before running from an entry node
    pub refresh_before_execute: bool,
    /// Pull a node's data dependencies right before the engine invokes it
    pub pull_dependencies: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_event: DEFAULT_START_EVENT.to_string(),
            tick_event: DEFAULT_TICK_EVENT.to_string(),
            refresh_before_execute: true,
            pull_dependencies: true,
        }
    }
}

impl EngineConfig {
    /// Parse from a RON string. Missing fields take their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Load from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_ron_str(&source)?;
        tracing::debug!("Loaded engine config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.start_event, "On Start");
        assert_eq!(config.tick_event, "On Tick");
        assert!(config.refresh_before_execute);
        assert!(config.pull_dependencies);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = EngineConfig::from_ron_str("(start_event: \"Begin Play\")").unwrap();
        assert_eq!(config.start_event, "Begin Play");
        assert_eq!(config.tick_event, DEFAULT_TICK_EVENT);
    }

    #[test]
    fn test_serialization() {
        let mut config = EngineConfig::default();
        config.pull_dependencies = false;
        let ron_str = config.to_ron_string().unwrap();
        let loaded = EngineConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_ron() {
        assert!(matches!(
            EngineConfig::from_ron_str("(start_event: 3)"),
            Err(ConfigError::Parse(_))
        ));
    }
}
