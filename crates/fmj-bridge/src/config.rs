//! Bridge configuration
//!
//! ```json
//! {
//!   "host": "192.168.1.20",
//!   "port": 50000,
//!   "scan_interval": 5,
//!   "zones": {
//!     "1": { "name": "Living Room" },
//!     "2": { "turn_on": { "service": "switch.turn_on", "data": { "entity_id": "switch.amp" } } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use fmj_protocol::{LinkId, Zone, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::host::ActionConfig;

/// Default seconds between connection attempts
pub const DEFAULT_SCAN_INTERVAL: u64 = 5;

/// Prefix of generated entity names
pub const DEFAULT_NAME: &str = "Arcam FMJ";

/// Per-zone settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Entity name; defaults to `"Arcam FMJ - <zone>"`
    #[serde(default)]
    pub name: Option<String>,
    /// Host action that turns the zone on when the receiver cannot
    #[serde(default)]
    pub turn_on: Option<ActionConfig>,
}

/// Settings for one receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Receiver host name or address
    pub host: String,
    /// Control port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Zones to expose, keyed by zone number
    #[serde(default = "default_zones")]
    pub zones: BTreeMap<u8, ZoneConfig>,
    /// Seconds between connection attempts, also the connect timeout
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_zones() -> BTreeMap<u8, ZoneConfig> {
    BTreeMap::from([(1, ZoneConfig::default())])
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL
}

impl BridgeConfig {
    /// Configuration for `host` with every other setting at its default
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            zones: default_zones(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.scan_interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        if let Some(number) = self.zones.keys().find(|n| Zone::from_number(**n).is_none()) {
            return Err(ConfigError::InvalidZone(*number));
        }
        Ok(())
    }

    /// Identity of the receiver link
    pub fn link_id(&self) -> LinkId {
        LinkId::new(self.host.clone(), self.port)
    }

    /// Connect timeout and pause between failed attempts
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// Configured zones in zone order
    pub fn zones(&self) -> Result<Vec<(Zone, ZoneConfig)>, ConfigError> {
        self.zones
            .iter()
            .map(|(number, config)| {
                Zone::from_number(*number)
                    .map(|zone| (zone, config.clone()))
                    .ok_or(ConfigError::InvalidZone(*number))
            })
            .collect()
    }

    /// Entity name of `zone`
    pub fn entity_name(&self, zone: Zone) -> String {
        self.zones
            .get(&zone.number())
            .and_then(|config| config.name.clone())
            .unwrap_or_else(|| format!("{} - {}", DEFAULT_NAME, zone))
    }
}
