//! Inspector configuration
//!
//! Read once when a session starts. Settings live under an `[inspector]`
//! table so the file can be shared with other host settings:
//!
//! ```toml
//! [inspector]
//! page_size = 40
//! include_non_public = false
//! auto_update = true
//! blacklist = ["Camera.*", "*.Finalize"]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default viewport capacity
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Default maximum length of value previews
pub const DEFAULT_PREVIEW_LENGTH: usize = 200;

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InspectorConfig {
    /// Viewport capacity of the paged views
    pub page_size: usize,
    /// Include protected and private members
    pub include_non_public: bool,
    /// Re-evaluate visible members on every tick
    pub auto_update: bool,
    /// Evaluate cheap members the first time they are displayed
    pub auto_evaluate: bool,
    /// Maximum length of value previews
    pub preview_length: usize,
    /// Extra signature patterns to hide
    pub blacklist: Vec<String>,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            include_non_public: true,
            auto_update: false,
            auto_evaluate: true,
            preview_length: DEFAULT_PREVIEW_LENGTH,
            blacklist: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    inspector: InspectorConfig,
}

impl InspectorConfig {
    /// Parse from TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.inspector.validate()
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            page_size = config.page_size,
            "loaded inspector config"
        );
        Ok(config)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".to_string()));
        }
        if self.preview_length < 4 {
            return Err(ConfigError::Invalid(
                "preview_length must be at least 4".to_string(),
            ));
        }
        if let Some(empty) = self.blacklist.iter().position(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "blacklist entry {} is empty",
                empty
            )));
        }
        Ok(self)
    }
}
