//! Zone controller
//!
//! One [`ZoneController`] per configured zone presents that zone to the host
//! as a media player. It keeps its own [`ZoneState`] cache, even when two
//! zones share a link, and translates host commands into link requests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use fmj_protocol::{
    DecodeMode2Ch, DecodeModeMch, Field, Link, LinkError, LinkId, Request, SourceCode, Zone,
    MAX_VOLUME,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::entity::{CommandSink, LifecycleHook, ReadableState};
use crate::error::BridgeError;
use crate::events::LinkEvent;
use crate::host::{ActionConfig, Host};
use crate::state::{Capabilities, MediaContentType, PowerState, ZoneState};

/// Fields every zone reports
const ZONE_FIELDS: &[Field] = &[Field::Power, Field::Volume, Field::Mute, Field::Source];

/// Fields only the main zone reports
const MAIN_ZONE_FIELDS: &[Field] = &[
    Field::IncomingAudioFormat,
    Field::DecodeMode2Ch,
    Field::DecodeModeMch,
];

/// Media-player presentation of one receiver zone
pub struct ZoneController {
    link: Arc<dyn Link>,
    host: Arc<dyn Host>,
    name: String,
    zone: Zone,
    turn_on: Option<ActionConfig>,
    state: Mutex<ZoneState>,
}

impl ZoneController {
    /// Create a controller with an empty cache
    ///
    /// `turn_on` is invoked through the host when the receiver cannot
    /// report or switch power for this zone.
    pub fn new(
        link: Arc<dyn Link>,
        host: Arc<dyn Host>,
        name: impl Into<String>,
        zone: Zone,
        turn_on: Option<ActionConfig>,
    ) -> Self {
        Self {
            link,
            host,
            name: name.into(),
            zone,
            turn_on,
            state: Mutex::new(ZoneState::default()),
        }
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn link_id(&self) -> &LinkId {
        self.link.id()
    }

    /// Copy of the cached state
    pub fn snapshot(&self) -> ZoneState {
        self.state().clone()
    }

    /// Consume `events` in a background task
    ///
    /// The task ends when the channel closes, which happens once the
    /// supervisor publishing on it has stopped.
    pub fn attach(self: Arc<Self>, mut events: broadcast::Receiver<LinkEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if event.is_lifecycle() {
                            debug!("{} received {:?}", self.name, event);
                        }
                        self.handle_event(&event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "{} missed {} events from {}, resynchronizing",
                            self.name,
                            skipped,
                            self.link.id()
                        );
                        self.resync().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("{} detached from {}", self.name, self.link.id());
        })
    }

    fn state(&self) -> MutexGuard<'_, ZoneState> {
        // Every update is a single assignment, so a poisoned cache is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Refresh, then tell the host
    async fn resync(&self) {
        if let Err(e) = self.refresh().await {
            warn!("Failed to refresh {}: {}", self.name, e);
        }
        self.host.request_update(&self.name);
    }

    /// Send one request and apply the answer
    async fn command(&self, request: Request) {
        debug!("{}: sending {:?}", self.name, request);
        match self.link.request(self.zone, request).await {
            Ok(Some(report)) => {
                self.state().apply(&report);
            }
            Ok(None) => {
                warn!("{}: receiver rejected {:?}", self.name, request);
            }
            Err(e) => {
                warn!("{}: {:?} failed: {}", self.name, request, e);
            }
        }
        self.host.request_update(&self.name);
    }

    /// Query one field into `state`
    async fn query(&self, state: &mut ZoneState, field: Field) -> Result<(), LinkError> {
        if let Some(report) = self.link.request(self.zone, Request::Query(field)).await? {
            state.apply(&report);
        }
        Ok(())
    }
}

impl ReadableState for ZoneController {
    fn name(&self) -> &str {
        &self.name
    }

    fn power_state(&self) -> PowerState {
        if self.state().power == Some(true) {
            PowerState::On
        } else {
            PowerState::Off
        }
    }

    fn supported_capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::SELECT_SOURCE
            | Capabilities::VOLUME_SET
            | Capabilities::VOLUME_MUTE
            | Capabilities::VOLUME_STEP
            | Capabilities::TURN_OFF;

        if self.zone == Zone::Main {
            capabilities |= Capabilities::SELECT_SOUND_MODE;
        }
        if self.state().power.is_some() || self.turn_on.is_some() {
            capabilities |= Capabilities::TURN_ON;
        }
        capabilities
    }

    fn current_source(&self) -> Option<String> {
        self.state().source.map(|source| source.name().to_string())
    }

    fn source_choices(&self) -> Vec<String> {
        SourceCode::names()
    }

    fn current_sound_mode(&self) -> Option<String> {
        if self.zone != Zone::Main {
            return None;
        }
        self.state().active_decode_mode().map(str::to_string)
    }

    fn sound_mode_choices(&self) -> Option<Vec<String>> {
        if self.zone != Zone::Main {
            return None;
        }
        Some(self.state().decode_mode_names())
    }

    fn is_muted(&self) -> Option<bool> {
        self.state().mute
    }

    fn volume_fraction(&self) -> Option<f64> {
        self.state().volume_fraction()
    }

    fn media_content_type(&self) -> Option<MediaContentType> {
        match self.state().source {
            Some(source) if source.is_tuner() => Some(MediaContentType::Music),
            _ => None,
        }
    }

    fn now_playing_title(&self) -> Option<String> {
        let state = self.state();
        let source = state.source?;
        match state.channel_text() {
            Some(channel) if !channel.is_empty() => Some(format!("{} - {}", source, channel)),
            _ => Some(source.name().to_string()),
        }
    }

    fn now_playing_channel_text(&self) -> Option<String> {
        self.state().channel_text().map(str::to_string)
    }

    fn now_playing_artist_text(&self) -> Option<String> {
        let state = self.state();
        match state.source {
            Some(SourceCode::Dab) => state.dls_pdt.clone(),
            _ => None,
        }
    }
}

#[async_trait]
impl CommandSink for ZoneController {
    async fn set_mute(&self, mute: bool) -> Result<(), BridgeError> {
        self.command(Request::SetMute { mute }).await;
        Ok(())
    }

    async fn set_volume_fraction(&self, fraction: f64) -> Result<(), BridgeError> {
        debug_assert!(
            (0.0..=1.0).contains(&fraction),
            "volume fraction {} outside 0.0..=1.0",
            fraction
        );
        let volume = (fraction.clamp(0.0, 1.0) * f64::from(MAX_VOLUME)).round() as u8;
        self.command(Request::SetVolume { volume }).await;
        Ok(())
    }

    async fn volume_step_up(&self) -> Result<(), BridgeError> {
        self.command(Request::IncVolume).await;
        Ok(())
    }

    async fn volume_step_down(&self) -> Result<(), BridgeError> {
        self.command(Request::DecVolume).await;
        Ok(())
    }

    async fn select_source(&self, source: &str) -> Result<(), BridgeError> {
        let source = SourceCode::from_name(source)
            .ok_or_else(|| BridgeError::UnknownSource(source.to_string()))?;
        self.command(Request::SetSource { source }).await;
        Ok(())
    }

    async fn select_sound_mode(&self, mode: &str) -> Result<(), BridgeError> {
        let two_channel = self.state().is_two_channel();
        let request = if two_channel {
            DecodeMode2Ch::from_name(mode).map(|mode| Request::SetDecodeMode2Ch { mode })
        } else {
            DecodeModeMch::from_name(mode).map(|mode| Request::SetDecodeModeMch { mode })
        };
        let request = request.ok_or_else(|| BridgeError::UnknownSoundMode(mode.to_string()))?;
        self.command(request).await;
        Ok(())
    }

    async fn power_on(&self) -> Result<(), BridgeError> {
        let power_known = self.state().power.is_some();
        if power_known {
            self.command(Request::SetPower { on: true }).await;
            return Ok(());
        }

        if let Some(action) = &self.turn_on {
            info!("Turning on {} via {}", self.name, action.service);
            self.host.call_action(action).await?;
            self.host.request_update(&self.name);
            return Ok(());
        }

        let e = BridgeError::CapabilityUnsupported("turning on");
        error!("Unable to turn on {}: {}", self.name, e);
        Ok(())
    }

    async fn power_off(&self) -> Result<(), BridgeError> {
        self.command(Request::SetPower { on: false }).await;
        Ok(())
    }
}

#[async_trait]
impl LifecycleHook for ZoneController {
    async fn refresh(&self) -> Result<(), LinkError> {
        let mut fresh = ZoneState::default();

        for field in ZONE_FIELDS {
            self.query(&mut fresh, *field).await?;
        }
        if self.zone == Zone::Main {
            for field in MAIN_ZONE_FIELDS {
                self.query(&mut fresh, *field).await?;
            }
        }
        match fresh.source {
            Some(SourceCode::Dab) => {
                self.query(&mut fresh, Field::DabStation).await?;
                self.query(&mut fresh, Field::DlsPdt).await?;
            }
            Some(SourceCode::Fm) => {
                self.query(&mut fresh, Field::RdsInformation).await?;
            }
            _ => {}
        }

        debug!("{} refreshed: {:?}", self.name, fresh);
        *self.state() = fresh;
        Ok(())
    }

    async fn handle_event(&self, event: &LinkEvent) {
        if event.link() != self.link.id() {
            return;
        }

        match event {
            LinkEvent::Started { .. } => {
                info!("Update {} on connect", self.name);
                self.resync().await;
            }
            LinkEvent::Data { frame, .. } => {
                if frame.zone == self.zone {
                    self.state().apply(&frame.report);
                    self.host.request_update(&self.name);
                }
            }
            LinkEvent::Stopped { .. } => {
                self.state().clear();
                self.host.request_update(&self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::MediaPlayerEntity;
    use crate::error::HostError;
    use fmj_protocol::{Frame, IncomingAudioFormat, Report};
    use fmj_sim::{VirtualReceiver, ZoneModel};

    #[derive(Default)]
    struct RecordingHost {
        updates: Mutex<Vec<String>>,
        actions: Mutex<Vec<String>>,
    }

    impl RecordingHost {
        fn updates(&self) -> Vec<String> {
            self.updates.lock().unwrap().clone()
        }

        fn actions(&self) -> Vec<String> {
            self.actions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Host for RecordingHost {
        fn add_entities(&self, _entities: Vec<Arc<dyn MediaPlayerEntity>>) {}

        fn request_update(&self, entity: &str) {
            self.updates.lock().unwrap().push(entity.to_string());
        }

        async fn call_action(&self, action: &ActionConfig) -> Result<(), HostError> {
            self.actions.lock().unwrap().push(action.service.clone());
            Ok(())
        }
    }

    struct Fixture {
        receiver: Arc<VirtualReceiver>,
        host: Arc<RecordingHost>,
    }

    impl Fixture {
        async fn connected() -> Self {
            let receiver = Arc::new(VirtualReceiver::new(LinkId::new("avr", 50000)));
            receiver.connect().await.unwrap();
            Self {
                receiver,
                host: Arc::new(RecordingHost::default()),
            }
        }

        fn controller(&self, zone: Zone, turn_on: Option<ActionConfig>) -> ZoneController {
            ZoneController::new(
                self.receiver.clone(),
                self.host.clone(),
                format!("Arcam FMJ - {}", zone),
                zone,
                turn_on,
            )
        }

        fn started(&self) -> LinkEvent {
            LinkEvent::Started {
                link: self.receiver.id().clone(),
            }
        }
    }

    #[tokio::test]
    async fn test_power_off_until_refreshed() {
        let fixture = Fixture::connected().await;
        let zone = fixture.controller(Zone::Main, None);
        assert_eq!(zone.power_state(), PowerState::Off);
        assert_eq!(zone.volume_fraction(), None);

        zone.handle_event(&fixture.started()).await;

        assert_eq!(zone.power_state(), PowerState::On);
        assert_eq!(zone.current_source(), Some("CD".to_string()));
        assert_eq!(fixture.host.updates(), vec!["Arcam FMJ - 1".to_string()]);
    }

    #[tokio::test]
    async fn test_capabilities_by_zone() {
        let fixture = Fixture::connected().await;
        let main = fixture.controller(Zone::Main, None);
        let zone2 = fixture.controller(Zone::Zone2, None);
        main.refresh().await.unwrap();
        zone2.refresh().await.unwrap();

        let base = Capabilities::SELECT_SOURCE
            | Capabilities::VOLUME_SET
            | Capabilities::VOLUME_MUTE
            | Capabilities::VOLUME_STEP
            | Capabilities::TURN_OFF
            | Capabilities::TURN_ON;
        assert_eq!(
            main.supported_capabilities(),
            base | Capabilities::SELECT_SOUND_MODE
        );
        assert_eq!(zone2.supported_capabilities(), base);
    }

    #[tokio::test]
    async fn test_unknown_power_without_fallback() {
        let fixture = Fixture::connected().await;
        let mut model = ZoneModel::zone2();
        model.power = None;
        fixture.receiver.set_zone(Zone::Zone2, model);

        let zone = fixture.controller(Zone::Zone2, None);
        zone.refresh().await.unwrap();
        assert!(!zone.supported_capabilities().contains(Capabilities::TURN_ON));

        let requests_before = fixture.receiver.requests().len();
        zone.power_on().await.unwrap();
        assert_eq!(fixture.receiver.requests().len(), requests_before);
        assert!(fixture.host.actions().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_power_uses_fallback_action() {
        let fixture = Fixture::connected().await;
        let mut model = ZoneModel::zone2();
        model.power = None;
        fixture.receiver.set_zone(Zone::Zone2, model);

        let zone = fixture.controller(Zone::Zone2, Some(ActionConfig::new("switch.turn_on")));
        assert!(zone.supported_capabilities().contains(Capabilities::TURN_ON));

        zone.refresh().await.unwrap();
        zone.power_on().await.unwrap();
        assert_eq!(fixture.host.actions(), vec!["switch.turn_on".to_string()]);
    }

    #[tokio::test]
    async fn test_power_on_direct_when_power_known() {
        let fixture = Fixture::connected().await;
        let zone = fixture.controller(Zone::Zone2, Some(ActionConfig::new("switch.turn_on")));
        zone.refresh().await.unwrap();
        assert_eq!(zone.power_state(), PowerState::Off);

        zone.power_on().await.unwrap();
        assert_eq!(zone.power_state(), PowerState::On);
        assert_eq!(fixture.receiver.zone(Zone::Zone2).power, Some(true));
        assert!(fixture.host.actions().is_empty());

        zone.power_off().await.unwrap();
        assert_eq!(zone.power_state(), PowerState::Off);
    }

    #[tokio::test]
    async fn test_bogus_source_leaves_cache() {
        let fixture = Fixture::connected().await;
        let zone = fixture.controller(Zone::Main, None);
        zone.refresh().await.unwrap();
        let requests_before = fixture.receiver.requests().len();

        let result = zone.select_source("BOGUS").await;
        assert!(matches!(result, Err(BridgeError::UnknownSource(name)) if name == "BOGUS"));
        assert_eq!(zone.current_source(), Some("CD".to_string()));
        assert_eq!(fixture.receiver.requests().len(), requests_before);
    }

    #[tokio::test]
    async fn test_select_source_sends_one_request() {
        let fixture = Fixture::connected().await;
        let zone = fixture.controller(Zone::Main, None);
        let requests_before = fixture.receiver.requests().len();

        zone.select_source("DAB").await.unwrap();
        let requests = fixture.receiver.requests();
        assert_eq!(requests.len(), requests_before + 1);
        assert_eq!(
            requests.last(),
            Some(&(
                Zone::Main,
                Request::SetSource {
                    source: SourceCode::Dab
                }
            ))
        );
        assert_eq!(zone.current_source(), Some("DAB".to_string()));
        assert_eq!(zone.media_content_type(), Some(MediaContentType::Music));
    }

    #[tokio::test]
    async fn test_sound_mode_lists_follow_format() {
        let fixture = Fixture::connected().await;
        let main = fixture.controller(Zone::Main, None);
        let zone2 = fixture.controller(Zone::Zone2, None);

        // Nothing reported yet counts as 2-channel
        assert_eq!(main.sound_mode_choices(), Some(DecodeMode2Ch::names()));
        assert_eq!(zone2.sound_mode_choices(), None);
        assert_eq!(zone2.current_sound_mode(), None);

        main.refresh().await.unwrap();
        assert_eq!(main.current_sound_mode(), Some("STEREO".to_string()));

        fixture.receiver.panel(
            Zone::Main,
            Report::IncomingAudioFormat {
                format: IncomingAudioFormat::DolbyDigital,
            },
        );
        main.refresh().await.unwrap();
        assert_eq!(main.sound_mode_choices(), Some(DecodeModeMch::names()));
        assert_eq!(main.current_sound_mode(), Some("MULTI_CHANNEL".to_string()));
    }

    #[tokio::test]
    async fn test_select_sound_mode_routes_by_format() {
        let fixture = Fixture::connected().await;
        let main = fixture.controller(Zone::Main, None);
        main.refresh().await.unwrap();

        main.select_sound_mode("DOLBY_PL").await.unwrap();
        assert_eq!(
            fixture.receiver.zone(Zone::Main).decode_mode_2ch,
            Some(DecodeMode2Ch::DolbyPl)
        );

        // A multichannel-only name is unknown while the stream is 2-channel
        let result = main.select_sound_mode("STEREO_DOWNMIX").await;
        assert!(matches!(result, Err(BridgeError::UnknownSoundMode(_))));

        fixture.receiver.panel(
            Zone::Main,
            Report::IncomingAudioFormat {
                format: IncomingAudioFormat::Dts,
            },
        );
        main.refresh().await.unwrap();
        main.select_sound_mode("STEREO_DOWNMIX").await.unwrap();
        assert_eq!(
            fixture.receiver.zone(Zone::Main).decode_mode_mch,
            Some(DecodeModeMch::StereoDownmix)
        );
        assert_eq!(main.current_sound_mode(), Some("STEREO_DOWNMIX".to_string()));
    }

    #[tokio::test]
    async fn test_volume_commands() {
        let fixture = Fixture::connected().await;
        let zone = fixture.controller(Zone::Main, None);

        zone.set_volume_fraction(0.5).await.unwrap();
        assert_eq!(fixture.receiver.zone(Zone::Main).volume, 50);
        assert_eq!(zone.volume_fraction(), Some(50.0 / 99.0));

        zone.volume_step_up().await.unwrap();
        assert_eq!(zone.snapshot().volume, Some(51));
        zone.volume_step_down().await.unwrap();
        zone.volume_step_down().await.unwrap();
        assert_eq!(zone.snapshot().volume, Some(49));

        zone.set_volume_fraction(0.0).await.unwrap();
        assert_eq!(zone.volume_fraction(), Some(0.0));

        zone.set_mute(true).await.unwrap();
        assert_eq!(zone.is_muted(), Some(true));
    }

    #[tokio::test]
    async fn test_command_while_disconnected_is_not_an_error() {
        let fixture = Fixture::connected().await;
        fixture.receiver.close().await;
        let zone = fixture.controller(Zone::Main, None);

        zone.set_mute(true).await.unwrap();
        assert_eq!(zone.is_muted(), None);
        assert!(zone.refresh().await.is_err());
    }

    #[tokio::test]
    async fn test_data_applies_only_own_zone() {
        let fixture = Fixture::connected().await;
        let zone2 = fixture.controller(Zone::Zone2, None);
        let link = fixture.receiver.id().clone();

        zone2
            .handle_event(&LinkEvent::Data {
                link: link.clone(),
                frame: Frame::new(Zone::Main, Report::Volume { volume: 60 }),
            })
            .await;
        assert_eq!(zone2.snapshot().volume, None);
        assert!(fixture.host.updates().is_empty());

        zone2
            .handle_event(&LinkEvent::Data {
                link,
                frame: Frame::new(Zone::Zone2, Report::Volume { volume: 25 }),
            })
            .await;
        assert_eq!(zone2.snapshot().volume, Some(25));
        assert_eq!(fixture.host.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_events_for_other_links_ignored() {
        let fixture = Fixture::connected().await;
        let zone = fixture.controller(Zone::Main, None);

        zone.handle_event(&LinkEvent::Started {
            link: LinkId::new("other", 50000),
        })
        .await;
        assert_eq!(zone.snapshot(), ZoneState::default());
        assert!(fixture.receiver.requests().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_clears_cache() {
        let fixture = Fixture::connected().await;
        let zone = fixture.controller(Zone::Main, None);
        zone.handle_event(&fixture.started()).await;
        assert_eq!(zone.power_state(), PowerState::On);

        zone.handle_event(&LinkEvent::Stopped {
            link: fixture.receiver.id().clone(),
        })
        .await;
        assert_eq!(zone.power_state(), PowerState::Off);
        assert_eq!(zone.snapshot(), ZoneState::default());
        assert_eq!(fixture.host.updates().len(), 2);
    }

    #[tokio::test]
    async fn test_now_playing_on_tuners() {
        let fixture = Fixture::connected().await;
        let mut model = ZoneModel::main();
        model.source = SourceCode::Dab;
        model.dab_station = Some("Jazz FM".to_string());
        model.dls_pdt = Some("Miles Davis".to_string());
        fixture.receiver.set_zone(Zone::Main, model);

        let zone = fixture.controller(Zone::Main, None);
        assert_eq!(zone.now_playing_title(), None);

        zone.refresh().await.unwrap();
        assert_eq!(zone.now_playing_title(), Some("DAB - Jazz FM".to_string()));
        assert_eq!(zone.now_playing_channel_text(), Some("Jazz FM".to_string()));
        assert_eq!(zone.now_playing_artist_text(), Some("Miles Davis".to_string()));

        zone.select_source("CD").await.unwrap();
        assert_eq!(zone.now_playing_title(), Some("CD".to_string()));
        assert_eq!(zone.now_playing_channel_text(), None);
        assert_eq!(zone.now_playing_artist_text(), None);
        assert_eq!(zone.media_content_type(), None);
    }

    #[test]
    fn test_entity_defaults() {
        let receiver = Arc::new(VirtualReceiver::new(LinkId::new("avr", 50000)));
        let zone = ZoneController::new(
            receiver,
            Arc::new(RecordingHost::default()),
            "Living Room",
            Zone::Main,
            None,
        );
        assert_eq!(zone.name(), "Living Room");
        assert!(!zone.should_poll());
        assert_eq!(zone.source_choices().len(), SourceCode::ALL.len());
    }
}
