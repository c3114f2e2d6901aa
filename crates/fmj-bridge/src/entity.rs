//! Media-player capability traits
//!
//! A host sees a zone through three capability sets instead of a framework
//! base type:
//!
//! - [`ReadableState`]: presentation state, pure reads of the cache
//! - [`CommandSink`]: commands that change the receiver
//! - [`LifecycleHook`]: refresh and link event handling
//!
//! Anything implementing all three is a [`MediaPlayerEntity`].

use async_trait::async_trait;
use fmj_protocol::LinkError;

use crate::error::BridgeError;
use crate::events::LinkEvent;
use crate::state::{Capabilities, MediaContentType, PowerState};

/// Presentation state of a media player
///
/// Every method reads cached state; none performs I/O.
pub trait ReadableState: Send + Sync {
    /// Entity name
    fn name(&self) -> &str;

    /// Whether the host should poll for state
    ///
    /// Zones are push-updated by link events.
    fn should_poll(&self) -> bool {
        false
    }

    /// On only when the receiver reported the zone powered
    fn power_state(&self) -> PowerState;

    /// Operations the zone currently supports
    fn supported_capabilities(&self) -> Capabilities;

    /// Name of the selected input
    fn current_source(&self) -> Option<String>;

    /// Names of every selectable input
    fn source_choices(&self) -> Vec<String>;

    /// Name of the decode mode in effect
    fn current_sound_mode(&self) -> Option<String>;

    /// Names of the decode modes selectable for the incoming stream
    fn sound_mode_choices(&self) -> Option<Vec<String>>;

    fn is_muted(&self) -> Option<bool>;

    /// Volume between 0.0 and 1.0
    fn volume_fraction(&self) -> Option<f64>;

    fn media_content_type(&self) -> Option<MediaContentType>;

    /// Input name, followed by the channel text when there is one
    fn now_playing_title(&self) -> Option<String>;

    /// Station name or RDS text of the selected tuner
    fn now_playing_channel_text(&self) -> Option<String>;

    /// DLS/PDT text of the DAB tuner
    fn now_playing_artist_text(&self) -> Option<String>;
}

/// Commands accepted by a media player
///
/// Arguments outside the receiver's vocabulary are rejected before anything
/// is sent. Connection problems are not reported here; they show up as
/// stale state and a `Stopped` event.
#[async_trait]
pub trait CommandSink: Send + Sync {
    async fn set_mute(&self, mute: bool) -> Result<(), BridgeError>;

    /// Set the volume from a fraction in `0.0..=1.0`
    async fn set_volume_fraction(&self, fraction: f64) -> Result<(), BridgeError>;

    async fn volume_step_up(&self) -> Result<(), BridgeError>;

    async fn volume_step_down(&self) -> Result<(), BridgeError>;

    /// Select an input by name
    async fn select_source(&self, source: &str) -> Result<(), BridgeError>;

    /// Select a decode mode by name
    async fn select_sound_mode(&self, mode: &str) -> Result<(), BridgeError>;

    /// Turn the zone on; best effort
    async fn power_on(&self) -> Result<(), BridgeError>;

    async fn power_off(&self) -> Result<(), BridgeError>;
}

/// Hooks driven by the connection lifecycle
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Re-read every cached value from the receiver
    ///
    /// The cache is left as it was when any query fails.
    async fn refresh(&self) -> Result<(), LinkError>;

    /// React to an event of the entity's link
    async fn handle_event(&self, event: &LinkEvent);
}

/// A media player a host can register
pub trait MediaPlayerEntity: ReadableState + CommandSink + LifecycleHook {}

impl<T: ReadableState + CommandSink + LifecycleHook> MediaPlayerEntity for T {}
