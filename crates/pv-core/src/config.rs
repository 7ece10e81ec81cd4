//! Viewer configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CoreError;

/// Configuration for query previews
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Maximum number of rows materialized for one query
    pub preview_cap: usize,

    /// Word in user statements that stands for the loaded file
    pub placeholder: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            preview_cap: 50,
            placeholder: "tbl".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&text)?;
        config.validate()?;

        info!("Loaded viewer configuration from {:?}", path);
        Ok(config)
    }

    /// Override the preview cap
    pub fn with_preview_cap(mut self, cap: usize) -> Self {
        self.preview_cap = cap;
        self
    }

    /// Override the placeholder word
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Check the cap is positive and the placeholder is a plain identifier
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.preview_cap == 0 {
            return Err(CoreError::Config("preview_cap must be at least 1".to_string()));
        }

        let mut chars = self.placeholder.chars();
        let valid_start = chars
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false);
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(CoreError::Config(format!(
                "placeholder '{}' must be a plain identifier",
                self.placeholder
            )));
        }

        Ok(())
    }

    /// Statement run automatically after a file loads
    pub fn default_query(&self) -> String {
        format!("SELECT * FROM {} LIMIT {}", self.placeholder, self.preview_cap)
    }
}
