//! Host that logs instead of presenting entities

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fmj_bridge::{ActionConfig, Host, HostError, MediaPlayerEntity, ReadableState};
use tracing::{debug, info};

/// Console stand-in for a home-automation host
#[derive(Default)]
pub struct LoggingHost {
    entities: Mutex<Vec<Arc<dyn MediaPlayerEntity>>>,
}

#[async_trait]
impl Host for LoggingHost {
    fn add_entities(&self, entities: Vec<Arc<dyn MediaPlayerEntity>>) {
        for entity in &entities {
            info!(
                "Registered media player '{}' (features {:#x})",
                entity.name(),
                entity.supported_capabilities().bits()
            );
        }
        self.entities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(entities);
    }

    fn request_update(&self, entity: &str) {
        debug!("State of '{}' changed", entity);
    }

    async fn call_action(&self, action: &ActionConfig) -> Result<(), HostError> {
        info!(
            "Calling {} with {}",
            action.service,
            serde_json::Value::Object(action.data.clone())
        );
        Ok(())
    }
}
