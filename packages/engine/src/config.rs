use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "scribe.config.json";

/// Engine configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Quiet period before a cached batch is flushed
    #[serde(default = "default_cache_debounce_ms")]
    pub cache_debounce_ms: u64,

    /// Extra attribute names that never enter the model
    #[serde(default)]
    pub transient_attributes: Vec<String>,

    /// Canonicalize inline `style` attributes when reading the surface
    #[serde(default = "default_true")]
    pub normalize_styles: bool,
}

fn default_cache_debounce_ms() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Load config from a directory, falling back to defaults when the file
    /// does not exist
    pub fn load(dir: &Path) -> Result<Self, EngineError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn cache_debounce(&self) -> Duration {
        Duration::from_millis(self.cache_debounce_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_debounce_ms: default_cache_debounce_ms(),
            transient_attributes: Vec::new(),
            normalize_styles: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "cacheDebounceMs": 25,
            "transientAttributes": ["data-hover"]
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cache_debounce_ms, 25);
        assert_eq!(config.transient_attributes, vec!["data-hover"]);
        assert!(config.normalize_styles);
        assert_eq!(config.cache_debounce(), Duration::from_millis(25));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
