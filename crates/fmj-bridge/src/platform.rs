//! Platform setup
//!
//! Wires one receiver link to its supervisor and zone controllers and
//! registers the controllers with the host.

use std::sync::Arc;

use fmj_protocol::Link;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::entity::MediaPlayerEntity;
use crate::error::ConfigError;
use crate::events::EventChannel;
use crate::host::Host;
use crate::supervisor::{Supervisor, SupervisorHandle};
use crate::zone::ZoneController;

/// A running receiver integration
pub struct Platform {
    supervisor: SupervisorHandle,
    controllers: Vec<Arc<ZoneController>>,
    tasks: Vec<JoinHandle<()>>,
}

/// Set up the integration for one receiver
///
/// Controllers subscribe before the supervisor starts, so none of them can
/// miss the first `Started` event.
pub fn setup(
    config: &BridgeConfig,
    link: Arc<dyn Link>,
    host: Arc<dyn Host>,
) -> Result<Platform, ConfigError> {
    config.validate()?;
    let zones = config.zones()?;
    let channel = EventChannel::new(link.id().clone());

    let mut controllers = Vec::with_capacity(zones.len());
    let mut tasks = Vec::with_capacity(zones.len());
    for (zone, zone_config) in zones {
        let controller = Arc::new(ZoneController::new(
            link.clone(),
            host.clone(),
            config.entity_name(zone),
            zone,
            zone_config.turn_on,
        ));
        tasks.push(controller.clone().attach(channel.subscribe()));
        controllers.push(controller);
    }

    let entities = controllers
        .iter()
        .map(|controller| controller.clone() as Arc<dyn MediaPlayerEntity>)
        .collect();
    host.add_entities(entities);

    info!(
        "Set up {} zone(s) for receiver {}",
        controllers.len(),
        link.id()
    );
    let supervisor = Supervisor::new(link, channel, config.retry_interval()).spawn();

    Ok(Platform {
        supervisor,
        controllers,
        tasks,
    })
}

impl Platform {
    pub fn supervisor(&self) -> &SupervisorHandle {
        &self.supervisor
    }

    /// Controllers in zone order
    pub fn controllers(&self) -> &[Arc<ZoneController>] {
        &self.controllers
    }

    /// Stop the supervisor and wait for every controller to detach
    pub async fn shutdown(self) {
        let Platform { supervisor, tasks, .. } = self;

        let link = supervisor.link_id().clone();
        supervisor.shutdown().await;
        for task in tasks {
            if let Err(e) = task.await {
                warn!("Zone task for {} ended abnormally: {}", link, e);
            }
        }
        info!("Receiver {} shut down", link);
    }
}
