use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::{GalaxyError, Result};

/// Runtime settings of a [`crate::engine::GalaxyEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rayon worker count; 0 lets rayon pick one per core.
    pub worker_threads: usize,
    pub thread_name: String,
    /// Longest side of thumbnails stored with cosmetic renders.
    pub thumbnail_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            thread_name: "galaxy_worker".to_string(),
            thumbnail_size: 256,
        }
    }
}

impl EngineConfig {
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GalaxyError::invalid("config", e.to_string()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| GalaxyError::invalid("config", e.to_string()))
    }

    /// Reads `.json` files as JSON and anything else as RON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GalaxyError::invalid("config", format!("cannot read {}: {e}", path.display())))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text),
            _ => Self::from_ron_str(&text),
        }
    }

    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GalaxyError::computation(format!("cannot encode config: {e}")))
    }
}
