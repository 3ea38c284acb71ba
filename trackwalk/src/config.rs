//! Engine configuration
//!
//! Loaded from a JSON file. Every field is optional; missing fields take
//! their defaults, and a missing file yields the default configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::connectivity::DEFAULT_NEIGHBOR_WINDOW;
use crate::core::TrackWalkError;
use crate::magnetic::MagneticSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub magnetic: MagneticSettings,
    /// Store positions scanned around a reference segment before a full scan
    pub neighbor_window: usize,
    /// Relink the store after selecting a track
    pub reorder_on_select: bool,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            magnetic: MagneticSettings::default(),
            neighbor_window: DEFAULT_NEIGHBOR_WINDOW,
            reorder_on_select: false,
        }
    }
}

impl TrackConfig {
    /// Load configuration from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, TrackWalkError> {
        if !path.exists() {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, TrackWalkError> {
        serde_json::from_str(content).map_err(|e| TrackWalkError::Config(e.to_string()))
    }
}
