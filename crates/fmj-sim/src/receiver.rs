//! Virtual receiver simulation
//!
//! Provides a simulated receiver that implements [`Link`] entirely in memory.
//! Requests mutate per-zone state and are answered with the resulting value,
//! as the real device answers every command with its new state. Changes made
//! through the "front panel" ([`VirtualReceiver::panel`]) are broadcast as
//! unsolicited frames while connected.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use fmj_protocol::{
    DecodeMode2Ch, DecodeModeMch, Field, Frame, IncomingAudioFormat, Link, LinkError, LinkId,
    Report, Request, SourceCode, Zone, MAX_VOLUME,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::debug;

/// Capacity of the unsolicited frame channel
pub const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Outcome of a connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectBehavior {
    /// Accept the connection
    Accept,
    /// Refuse the connection with the given reason
    Refuse(String),
    /// Never answer; the attempt stays pending until cancelled
    Hang,
}

/// Connection status shared with `process()` waiters
#[derive(Debug, Clone, PartialEq, Eq)]
enum Connection {
    Closed,
    Open,
    Dropped(LinkError),
}

/// State of one simulated zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneModel {
    /// Power state; `None` if the zone cannot report or switch power
    pub power: Option<bool>,
    /// Volume in device steps
    pub volume: u8,
    /// Mute state
    pub mute: bool,
    /// Selected input
    pub source: SourceCode,
    /// Incoming stream format (main zone only)
    pub incoming_audio_format: Option<IncomingAudioFormat>,
    /// 2-channel decode mode (main zone only)
    pub decode_mode_2ch: Option<DecodeMode2Ch>,
    /// Multichannel decode mode (main zone only)
    pub decode_mode_mch: Option<DecodeModeMch>,
    /// DAB station name
    pub dab_station: Option<String>,
    /// FM RDS text
    pub rds_information: Option<String>,
    /// DAB DLS/PDT text
    pub dls_pdt: Option<String>,
}

impl ZoneModel {
    /// Factory state for the main zone
    pub fn main() -> Self {
        Self {
            power: Some(true),
            volume: 30,
            mute: false,
            source: SourceCode::Cd,
            incoming_audio_format: Some(IncomingAudioFormat::Pcm),
            decode_mode_2ch: Some(DecodeMode2Ch::Stereo),
            decode_mode_mch: Some(DecodeModeMch::MultiChannel),
            dab_station: None,
            rds_information: None,
            dls_pdt: None,
        }
    }

    /// Factory state for zone 2
    pub fn zone2() -> Self {
        Self {
            power: Some(false),
            volume: 20,
            mute: false,
            source: SourceCode::FollowZone1,
            incoming_audio_format: None,
            decode_mode_2ch: None,
            decode_mode_mch: None,
            dab_station: None,
            rds_information: None,
            dls_pdt: None,
        }
    }

    /// Bring loaded values into the device range
    fn clamped(mut self) -> Self {
        self.volume = self.volume.min(MAX_VOLUME);
        self
    }

    /// Current value of `field`, as the receiver would report it
    fn report(&self, zone: Zone, field: Field) -> Option<Report> {
        if field.is_main_zone_only() && zone != Zone::Main {
            return None;
        }
        match field {
            Field::Power => self.power.map(|on| Report::Power { on }),
            Field::Volume => Some(Report::Volume {
                volume: self.volume,
            }),
            Field::Mute => Some(Report::Mute { mute: self.mute }),
            Field::Source => Some(Report::Source {
                source: self.source,
            }),
            Field::IncomingAudioFormat => self
                .incoming_audio_format
                .map(|format| Report::IncomingAudioFormat { format }),
            Field::DecodeMode2Ch => self
                .decode_mode_2ch
                .map(|mode| Report::DecodeMode2Ch { mode }),
            Field::DecodeModeMch => self
                .decode_mode_mch
                .map(|mode| Report::DecodeModeMch { mode }),
            Field::DabStation if self.source == SourceCode::Dab => self
                .dab_station
                .clone()
                .map(|name| Report::DabStation { name }),
            Field::RdsInformation if self.source == SourceCode::Fm => self
                .rds_information
                .clone()
                .map(|text| Report::RdsInformation { text }),
            Field::DlsPdt if self.source == SourceCode::Dab => {
                self.dls_pdt.clone().map(|text| Report::DlsPdt { text })
            }
            Field::DabStation | Field::RdsInformation | Field::DlsPdt => None,
        }
    }

    /// Apply a request and return the value the receiver answers with
    fn apply(&mut self, zone: Zone, request: Request) -> Option<Report> {
        match request {
            Request::Query(field) => return self.report(zone, field),
            Request::SetPower { on } => match self.power.as_mut() {
                Some(power) => *power = on,
                // Zones without power control reject the command
                None => return None,
            },
            Request::SetVolume { volume } => self.volume = volume.min(MAX_VOLUME),
            Request::IncVolume => self.volume = self.volume.saturating_add(1).min(MAX_VOLUME),
            Request::DecVolume => self.volume = self.volume.saturating_sub(1),
            Request::SetMute { mute } => self.mute = mute,
            Request::SetSource { source } => self.source = source,
            Request::SetDecodeMode2Ch { mode } => {
                if zone != Zone::Main {
                    return None;
                }
                self.decode_mode_2ch = Some(mode);
            }
            Request::SetDecodeModeMch { mode } => {
                if zone != Zone::Main {
                    return None;
                }
                self.decode_mode_mch = Some(mode);
            }
        }
        self.report(zone, request.field())
    }

    /// Overwrite the field carried by `report`
    fn store(&mut self, report: &Report) {
        match report.clone() {
            Report::Power { on } => self.power = Some(on),
            Report::Volume { volume } => self.volume = volume.min(MAX_VOLUME),
            Report::Mute { mute } => self.mute = mute,
            Report::Source { source } => self.source = source,
            Report::IncomingAudioFormat { format } => self.incoming_audio_format = Some(format),
            Report::DecodeMode2Ch { mode } => self.decode_mode_2ch = Some(mode),
            Report::DecodeModeMch { mode } => self.decode_mode_mch = Some(mode),
            Report::DabStation { name } => self.dab_station = Some(name),
            Report::RdsInformation { text } => self.rds_information = Some(text),
            Report::DlsPdt { text } => self.dls_pdt = Some(text),
        }
    }
}

/// Configuration for creating a virtual receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualReceiverConfig {
    /// Initial state of the main zone
    #[serde(default = "ZoneModel::main")]
    pub main: ZoneModel,
    /// Initial state of zone 2
    #[serde(default = "ZoneModel::zone2")]
    pub zone2: ZoneModel,
}

impl Default for VirtualReceiverConfig {
    fn default() -> Self {
        Self {
            main: ZoneModel::main(),
            zone2: ZoneModel::zone2(),
        }
    }
}

/// Mutable simulation state
#[derive(Debug)]
struct Inner {
    zones: HashMap<Zone, ZoneModel>,
    script: VecDeque<ConnectBehavior>,
    connect_attempts: Vec<Instant>,
    requests: Vec<(Zone, Request)>,
    close_count: usize,
}

/// A simulated receiver reachable through the [`Link`] interface
pub struct VirtualReceiver {
    id: LinkId,
    inner: Mutex<Inner>,
    status: watch::Sender<Connection>,
    frames: broadcast::Sender<Frame>,
}

impl VirtualReceiver {
    /// Create a receiver with factory state
    pub fn new(id: LinkId) -> Self {
        Self::from_config(id, VirtualReceiverConfig::default())
    }

    /// Create a receiver from configuration
    pub fn from_config(id: LinkId, config: VirtualReceiverConfig) -> Self {
        let zones = HashMap::from([
            (Zone::Main, config.main.clamped()),
            (Zone::Zone2, config.zone2.clamped()),
        ]);
        let (status, _) = watch::channel(Connection::Closed);
        let (frames, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        Self {
            id,
            inner: Mutex::new(Inner {
                zones,
                script: VecDeque::new(),
                connect_attempts: Vec::new(),
                requests: Vec::new(),
                close_count: 0,
            }),
            status,
            frames,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-update; the state is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue outcomes for upcoming connection attempts
    ///
    /// Once the script is exhausted every attempt is accepted.
    pub fn script_connects(&self, behaviors: impl IntoIterator<Item = ConnectBehavior>) {
        self.lock().script.extend(behaviors);
    }

    /// Times at which `connect()` was called
    pub fn connect_attempts(&self) -> Vec<Instant> {
        self.lock().connect_attempts.clone()
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<(Zone, Request)> {
        self.lock().requests.clone()
    }

    /// Number of times `close()` was called
    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    /// Snapshot of a zone's state
    pub fn zone(&self, zone: Zone) -> ZoneModel {
        self.lock()
            .zones
            .get(&zone)
            .cloned()
            .unwrap_or_else(ZoneModel::zone2)
    }

    /// Replace a zone's state without emitting frames
    pub fn set_zone(&self, zone: Zone, model: ZoneModel) {
        self.lock().zones.insert(zone, model.clamped());
    }

    /// Change a value on the front panel
    ///
    /// The new value is broadcast as an unsolicited frame when connected.
    pub fn panel(&self, zone: Zone, report: Report) {
        {
            let mut inner = self.lock();
            if let Some(model) = inner.zones.get_mut(&zone) {
                model.store(&report);
            }
        }
        if self.is_connected() {
            debug!("Virtual receiver {} panel change on zone {}: {:?}", self.id, zone, report);
            let _ = self.frames.send(Frame::new(zone, report));
        }
    }

    /// Simulate the receiver dropping the connection
    pub fn drop_connection(&self, reason: impl Into<String>) {
        let reason = reason.into();
        debug!("Virtual receiver {} dropping connection: {}", self.id, reason);
        self.status
            .send_replace(Connection::Dropped(LinkError::ConnectionFailed(reason)));
    }
}

#[async_trait]
impl Link for VirtualReceiver {
    fn id(&self) -> &LinkId {
        &self.id
    }

    fn is_connected(&self) -> bool {
        *self.status.borrow() == Connection::Open
    }

    async fn connect(&self) -> Result<(), LinkError> {
        let behavior = {
            let mut inner = self.lock();
            inner.connect_attempts.push(Instant::now());
            inner.script.pop_front().unwrap_or(ConnectBehavior::Accept)
        };

        match behavior {
            ConnectBehavior::Accept => {
                self.status.send_replace(Connection::Open);
                Ok(())
            }
            ConnectBehavior::Refuse(reason) => Err(LinkError::ConnectionFailed(reason)),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }

    async fn close(&self) {
        self.lock().close_count += 1;
        self.status.send_replace(Connection::Closed);
    }

    fn listen(&self) -> broadcast::Receiver<Frame> {
        self.frames.subscribe()
    }

    async fn process(&self) -> Result<(), LinkError> {
        let mut status = self.status.subscribe();
        loop {
            match &*status.borrow_and_update() {
                Connection::Open => {}
                Connection::Closed => return Ok(()),
                Connection::Dropped(e) => return Err(e.clone()),
            }
            if status.changed().await.is_err() {
                return Ok(());
            }
        }
    }

    async fn request(&self, zone: Zone, request: Request) -> Result<Option<Report>, LinkError> {
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        let mut inner = self.lock();
        inner.requests.push((zone, request));
        let report = inner
            .zones
            .get_mut(&zone)
            .and_then(|model| model.apply(zone, request));
        debug!("Virtual receiver {} zone {} {:?} -> {:?}", self.id, zone, request, report);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> VirtualReceiver {
        VirtualReceiver::new(LinkId::new("sim", 50000))
    }

    #[tokio::test]
    async fn test_requests_require_connection() {
        let rx = receiver();
        let result = rx.request(Zone::Main, Request::Query(Field::Power)).await;
        assert_eq!(result, Err(LinkError::NotConnected));

        rx.connect().await.unwrap();
        let result = rx.request(Zone::Main, Request::Query(Field::Power)).await;
        assert_eq!(result, Ok(Some(Report::Power { on: true })));
    }

    #[tokio::test]
    async fn test_volume_clamps_to_device_range() {
        let rx = receiver();
        rx.connect().await.unwrap();

        let report = rx
            .request(Zone::Main, Request::SetVolume { volume: 150 })
            .await
            .unwrap();
        assert_eq!(report, Some(Report::Volume { volume: 99 }));

        let report = rx.request(Zone::Main, Request::IncVolume).await.unwrap();
        assert_eq!(report, Some(Report::Volume { volume: 99 }));

        rx.request(Zone::Main, Request::SetVolume { volume: 0 })
            .await
            .unwrap();
        let report = rx.request(Zone::Main, Request::DecVolume).await.unwrap();
        assert_eq!(report, Some(Report::Volume { volume: 0 }));
    }

    #[tokio::test]
    async fn test_out_of_range_model_volume() {
        let mut config = VirtualReceiverConfig::default();
        config.main.volume = 255;
        let rx = VirtualReceiver::from_config(LinkId::new("sim", 50000), config);
        assert_eq!(rx.zone(Zone::Main).volume, MAX_VOLUME);

        let mut model = ZoneModel::zone2();
        model.volume = 200;
        rx.set_zone(Zone::Zone2, model);
        rx.connect().await.unwrap();

        let report = rx.request(Zone::Main, Request::IncVolume).await.unwrap();
        assert_eq!(report, Some(Report::Volume { volume: 99 }));
        let report = rx.request(Zone::Zone2, Request::IncVolume).await.unwrap();
        assert_eq!(report, Some(Report::Volume { volume: 99 }));
    }

    #[tokio::test]
    async fn test_zone2_has_no_decode_modes() {
        let rx = receiver();
        rx.connect().await.unwrap();

        let report = rx
            .request(Zone::Zone2, Request::Query(Field::DecodeMode2Ch))
            .await
            .unwrap();
        assert_eq!(report, None);

        let report = rx
            .request(
                Zone::Zone2,
                Request::SetDecodeMode2Ch {
                    mode: DecodeMode2Ch::DolbyPl,
                },
            )
            .await
            .unwrap();
        assert_eq!(report, None);
    }

    #[tokio::test]
    async fn test_zone_without_power_control() {
        let rx = receiver();
        let mut model = ZoneModel::zone2();
        model.power = None;
        rx.set_zone(Zone::Zone2, model);
        rx.connect().await.unwrap();

        let report = rx
            .request(Zone::Zone2, Request::SetPower { on: true })
            .await
            .unwrap();
        assert_eq!(report, None);
        assert_eq!(rx.zone(Zone::Zone2).power, None);
    }

    #[tokio::test]
    async fn test_tuner_text_only_on_tuner_source() {
        let rx = receiver();
        rx.connect().await.unwrap();
        rx.panel(
            Zone::Main,
            Report::DabStation {
                name: "Jazz FM".to_string(),
            },
        );

        let report = rx
            .request(Zone::Main, Request::Query(Field::DabStation))
            .await
            .unwrap();
        assert_eq!(report, None);

        rx.request(
            Zone::Main,
            Request::SetSource {
                source: SourceCode::Dab,
            },
        )
        .await
        .unwrap();
        let report = rx
            .request(Zone::Main, Request::Query(Field::DabStation))
            .await
            .unwrap();
        assert_eq!(
            report,
            Some(Report::DabStation {
                name: "Jazz FM".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_panel_changes_broadcast_when_connected() {
        let rx = receiver();
        let mut frames = rx.listen();

        // Not connected: state changes silently
        rx.panel(Zone::Main, Report::Volume { volume: 10 });
        assert!(frames.try_recv().is_err());

        rx.connect().await.unwrap();
        rx.panel(Zone::Main, Report::Volume { volume: 12 });
        let frame = frames.recv().await.unwrap();
        assert_eq!(frame, Frame::new(Zone::Main, Report::Volume { volume: 12 }));
        assert_eq!(rx.zone(Zone::Main).volume, 12);
    }

    #[tokio::test]
    async fn test_process_ends_on_close_and_drop() {
        let rx = receiver();
        rx.connect().await.unwrap();
        rx.close().await;
        assert_eq!(rx.process().await, Ok(()));

        rx.connect().await.unwrap();
        rx.drop_connection("cable pulled");
        assert_eq!(
            rx.process().await,
            Err(LinkError::ConnectionFailed("cable pulled".to_string()))
        );
        assert!(!rx.is_connected());
    }

    #[tokio::test]
    async fn test_scripted_connects() {
        let rx = receiver();
        rx.script_connects([ConnectBehavior::Refuse("no route".to_string())]);

        assert_eq!(
            rx.connect().await,
            Err(LinkError::ConnectionFailed("no route".to_string()))
        );
        assert!(!rx.is_connected());
        assert_eq!(rx.connect().await, Ok(()));
        assert!(rx.is_connected());
        assert_eq!(rx.connect_attempts().len(), 2);
    }
}
