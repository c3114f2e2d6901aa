//! Home-automation host interface
//!
//! The bridge does not own entity lifecycle or service dispatch; it reaches
//! the host only through [`Host`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::MediaPlayerEntity;
use crate::error::HostError;

/// A host service call, configured by the user
///
/// Used as the turn-on fallback for zones the receiver cannot power on
/// itself (for example an IR blaster or a smart plug).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Service to call, such as `"switch.turn_on"`
    pub service: String,
    /// Service call payload
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ActionConfig {
    /// Action calling `service` with an empty payload
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            data: Map::new(),
        }
    }
}

/// Services the host provides to the bridge
#[async_trait]
pub trait Host: Send + Sync + 'static {
    /// Register media-player entities
    fn add_entities(&self, entities: Vec<Arc<dyn MediaPlayerEntity>>);

    /// Ask the host to re-read an entity's presentation state
    fn request_update(&self, entity: &str);

    /// Invoke a configured action and wait for the host to report completion
    async fn call_action(&self, action: &ActionConfig) -> Result<(), HostError>;
}
