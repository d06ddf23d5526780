//! Sample configuration.
//!
//! Samples read their settings from an optional TOML file; every field has a
//! default so an empty (or missing) file is valid. The binary may override
//! individual fields from the command line after loading.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

/// Window settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Vulkan Sample".to_string(),
        }
    }
}

/// Top-level sample configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub window: WindowConfig,
    /// Enable Vulkan validation layers.
    pub validation: bool,
    /// Start with the application handling surface rotation (pre-rotate mode).
    pub pre_rotate: bool,
}

impl Config {
    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert!(!config.validation);
        assert!(!config.pre_rotate);
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            pre_rotate = true

            [window]
            width = 800
            "#,
        )
        .unwrap();
        assert!(config.pre_rotate);
        assert_eq!(config.window.width, 800);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn rejects_unknown_fields() {
        let result: std::result::Result<Config, _> = toml::from_str("frobnicate = 3");
        assert!(result.is_err());
    }
}
