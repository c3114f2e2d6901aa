//! Arcam FMJ Media-Player Bridge
//!
//! This crate exposes an Arcam FMJ AV receiver to a home-automation host as
//! one media player per zone.
//!
//! # Architecture
//!
//! - **Supervisor**: keeps the receiver link connected, reconnecting forever,
//!   and publishes `Started` / `Stopped` / `Data` on the link's
//!   [`EventChannel`]
//! - **Zone controllers**: one per configured zone, each with its own state
//!   cache, subscribed to the link's channel. `Started` triggers a full
//!   refresh, `Data` updates the cache in place, `Stopped` clears it
//! - **Host**: the [`Host`] trait is everything the bridge needs from the
//!   home-automation system; controllers are handed to it as
//!   [`MediaPlayerEntity`] trait objects
//!
//! # Example
//!
//! ```rust,ignore
//! use fmj_bridge::{platform, BridgeConfig};
//!
//! let config = BridgeConfig::load("fmj.json")?;
//! let platform = platform::setup(&config, link, host)?;
//!
//! // ... on host shutdown
//! platform.shutdown().await;
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod host;
pub mod platform;
pub mod state;
pub mod supervisor;
pub mod zone;

pub use config::{BridgeConfig, ZoneConfig};
pub use entity::{CommandSink, LifecycleHook, MediaPlayerEntity, ReadableState};
pub use error::{BridgeError, ConfigError, HostError};
pub use events::{EventChannel, LinkEvent};
pub use host::{ActionConfig, Host};
pub use platform::{setup, Platform};
pub use state::{Capabilities, ConnectionState, MediaContentType, PowerState, ZoneState};
pub use supervisor::{Supervisor, SupervisorHandle};
pub use zone::ZoneController;
