//! Console settings

use std::path::Path;

use anyhow::Context;
use fmj_bridge::BridgeConfig;
use fmj_sim::VirtualReceiverConfig;
use serde::{Deserialize, Serialize};

/// Settings file of the console
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Receiver and zone configuration
    pub receiver: BridgeConfig,
    /// Initial state of the simulated receiver
    #[serde(default)]
    pub simulator: VirtualReceiverConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            receiver: BridgeConfig::new("fmj.local"),
            simulator: VirtualReceiverConfig::default(),
        }
    }
}

impl Settings {
    /// Load and validate settings from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&json)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        settings.receiver.validate()?;
        Ok(settings)
    }
}
