//! Zone state tracking

use std::ops::{BitOr, BitOrAssign};

use fmj_protocol::{
    DecodeMode2Ch, DecodeModeMch, IncomingAudioFormat, Report, SourceCode, MAX_VOLUME,
};
use serde::{Deserialize, Serialize};

/// Connection state of a supervised link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection and no attempt in flight
    #[default]
    Disconnected,
    /// A connection attempt is in flight
    Connecting,
    /// Connected and processing incoming data
    Connected,
}

/// Power state presented to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    On,
    Off,
}

/// Kind of content currently playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaContentType {
    Music,
}

/// Set of operations a zone supports
///
/// Bit values follow the host's media-player feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const VOLUME_SET: Capabilities = Capabilities(4);
    pub const VOLUME_MUTE: Capabilities = Capabilities(8);
    pub const TURN_ON: Capabilities = Capabilities(128);
    pub const TURN_OFF: Capabilities = Capabilities(256);
    pub const VOLUME_STEP: Capabilities = Capabilities(1024);
    pub const SELECT_SOURCE: Capabilities = Capabilities(2048);
    pub const SELECT_SOUND_MODE: Capabilities = Capabilities(65536);

    /// The empty set
    pub const fn empty() -> Self {
        Capabilities(0)
    }

    /// Raw bit value
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Whether every capability in `other` is present
    pub const fn contains(&self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        Capabilities(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Snapshot of what the receiver last reported for one zone
///
/// `None` means the value has not been reported (or the receiver does not
/// report it for this zone).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneState {
    /// Power state
    pub power: Option<bool>,
    /// Volume in device steps (0..=99)
    pub volume: Option<u8>,
    /// Mute state
    pub mute: Option<bool>,
    /// Selected input
    pub source: Option<SourceCode>,
    /// Format of the incoming stream
    pub incoming_audio_format: Option<IncomingAudioFormat>,
    /// Decode mode used for 2-channel streams
    pub decode_mode_2ch: Option<DecodeMode2Ch>,
    /// Decode mode used for multichannel streams
    pub decode_mode_mch: Option<DecodeModeMch>,
    /// DAB station name (DAB source only)
    pub dab_station: Option<String>,
    /// RDS text (FM source only)
    pub rds_information: Option<String>,
    /// DLS/PDT text (DAB source only)
    pub dls_pdt: Option<String>,
}

impl ZoneState {
    /// Forget everything
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Apply a value reported by the receiver
    ///
    /// Tuner text is only kept while the matching tuner is the selected
    /// source; changing source drops text belonging to the previous tuner.
    pub fn apply(&mut self, report: &Report) {
        match report {
            Report::Power { on } => self.power = Some(*on),
            Report::Volume { volume } => self.volume = Some((*volume).min(MAX_VOLUME)),
            Report::Mute { mute } => self.mute = Some(*mute),
            Report::Source { source } => {
                self.source = Some(*source);
                if *source != SourceCode::Dab {
                    self.dab_station = None;
                    self.dls_pdt = None;
                }
                if *source != SourceCode::Fm {
                    self.rds_information = None;
                }
            }
            Report::IncomingAudioFormat { format } => self.incoming_audio_format = Some(*format),
            Report::DecodeMode2Ch { mode } => self.decode_mode_2ch = Some(*mode),
            Report::DecodeModeMch { mode } => self.decode_mode_mch = Some(*mode),
            Report::DabStation { name } if self.source == Some(SourceCode::Dab) => {
                self.dab_station = Some(name.clone())
            }
            Report::DlsPdt { text } if self.source == Some(SourceCode::Dab) => {
                self.dls_pdt = Some(text.clone())
            }
            Report::RdsInformation { text } if self.source == Some(SourceCode::Fm) => {
                self.rds_information = Some(text.clone())
            }
            Report::DabStation { .. } | Report::DlsPdt { .. } | Report::RdsInformation { .. } => {}
        }
    }

    /// Whether the incoming stream is handled by the 2-channel decode modes
    pub fn is_two_channel(&self) -> bool {
        IncomingAudioFormat::is_two_channel(self.incoming_audio_format)
    }

    /// Name of the decode mode in effect for the incoming stream
    pub fn active_decode_mode(&self) -> Option<&'static str> {
        if self.is_two_channel() {
            self.decode_mode_2ch.map(|mode| mode.name())
        } else {
            self.decode_mode_mch.map(|mode| mode.name())
        }
    }

    /// Names of the decode modes selectable for the incoming stream
    pub fn decode_mode_names(&self) -> Vec<String> {
        if self.is_two_channel() {
            DecodeMode2Ch::names()
        } else {
            DecodeModeMch::names()
        }
    }

    /// Channel text for the selected tuner
    pub fn channel_text(&self) -> Option<&str> {
        match self.source? {
            SourceCode::Dab => self.dab_station.as_deref(),
            SourceCode::Fm => self.rds_information.as_deref(),
            _ => None,
        }
    }

    /// Volume as a fraction of full scale
    pub fn volume_fraction(&self) -> Option<f64> {
        self.volume
            .map(|volume| f64::from(volume) / f64::from(MAX_VOLUME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_set_operations() {
        let mut caps = Capabilities::SELECT_SOURCE | Capabilities::VOLUME_SET;
        assert!(caps.contains(Capabilities::SELECT_SOURCE));
        assert!(!caps.contains(Capabilities::TURN_ON));

        caps |= Capabilities::TURN_ON;
        assert!(caps.contains(Capabilities::TURN_ON | Capabilities::VOLUME_SET));
        assert_eq!(caps.bits(), 2048 | 4 | 128);
        assert!(caps.contains(Capabilities::empty()));
    }

    #[test]
    fn test_apply_basic_reports() {
        let mut state = ZoneState::default();
        state.apply(&Report::Power { on: true });
        state.apply(&Report::Volume { volume: 45 });
        state.apply(&Report::Mute { mute: false });

        assert_eq!(state.power, Some(true));
        assert_eq!(state.volume, Some(45));
        assert_eq!(state.mute, Some(false));
    }

    #[test]
    fn test_tuner_text_requires_tuner_source() {
        let mut state = ZoneState::default();
        state.apply(&Report::DabStation {
            name: "Jazz".to_string(),
        });
        assert_eq!(state.dab_station, None);

        state.apply(&Report::Source {
            source: SourceCode::Dab,
        });
        state.apply(&Report::DabStation {
            name: "Jazz".to_string(),
        });
        state.apply(&Report::DlsPdt {
            text: "Now: Coltrane".to_string(),
        });
        assert_eq!(state.channel_text(), Some("Jazz"));

        state.apply(&Report::Source {
            source: SourceCode::Fm,
        });
        assert_eq!(state.dab_station, None);
        assert_eq!(state.dls_pdt, None);
        assert_eq!(state.channel_text(), None);

        state.apply(&Report::RdsInformation {
            text: "BBC R3".to_string(),
        });
        assert_eq!(state.channel_text(), Some("BBC R3"));
    }

    #[test]
    fn test_active_decode_mode_follows_format() {
        let mut state = ZoneState {
            decode_mode_2ch: Some(DecodeMode2Ch::DolbyPl),
            decode_mode_mch: Some(DecodeModeMch::StereoDownmix),
            ..Default::default()
        };

        // Unknown format counts as 2-channel
        assert_eq!(state.active_decode_mode(), Some("DOLBY_PL"));

        state.apply(&Report::IncomingAudioFormat {
            format: IncomingAudioFormat::DolbyDigital,
        });
        assert_eq!(state.active_decode_mode(), Some("STEREO_DOWNMIX"));
        assert_eq!(state.decode_mode_names(), DecodeModeMch::names());

        state.decode_mode_mch = None;
        assert_eq!(state.active_decode_mode(), None);
    }

    #[test]
    fn test_volume_fraction() {
        let mut state = ZoneState::default();
        assert_eq!(state.volume_fraction(), None);

        state.apply(&Report::Volume { volume: 0 });
        assert_eq!(state.volume_fraction(), Some(0.0));

        state.apply(&Report::Volume { volume: 99 });
        assert_eq!(state.volume_fraction(), Some(1.0));
    }

    #[test]
    fn test_clear() {
        let mut state = ZoneState::default();
        state.apply(&Report::Power { on: true });
        state.clear();
        assert_eq!(state, ZoneState::default());
    }
}
