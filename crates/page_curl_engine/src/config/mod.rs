//! Configuration system

use std::path::PathBuf;

pub use serde::{Serialize, Deserialize};

use crate::page::LIT_MATERIAL_ASSET;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Settings for the page curl sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageCurlConfig {
    /// Directories searched, in order, when resolving asset names
    pub search_paths: Vec<PathBuf>,
    /// Name of the compiled material asset
    pub material_asset: String,
    /// Optional image asset bound to the page's `imageTexture` parameter,
    /// resolved through `search_paths` like the material
    pub page_texture: Option<String>,
    /// Default log filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for PageCurlConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from("assets"), PathBuf::from(".")],
            material_asset: LIT_MATERIAL_ASSET.to_string(),
            page_texture: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config for PageCurlConfig {}
