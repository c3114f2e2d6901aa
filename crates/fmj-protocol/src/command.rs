//! Normalized requests and reports
//!
//! A [`Request`] is what a controller asks of one zone; a [`Report`] is a
//! value the receiver states about one zone, either as the answer to a
//! request or unsolicited when something changes on the device. Unsolicited
//! reports travel as [`Frame`]s.

use crate::codes::{DecodeMode2Ch, DecodeModeMch, IncomingAudioFormat, SourceCode, Zone};

/// Highest volume step the receiver accepts
pub const MAX_VOLUME: u8 = 99;

/// A queryable property of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    /// Standby / on
    Power,
    /// Volume in device steps (0..=99)
    Volume,
    /// Mute state
    Mute,
    /// Selected input
    Source,
    /// Format of the stream on the selected input
    IncomingAudioFormat,
    /// Decode mode applied to 2-channel streams
    DecodeMode2Ch,
    /// Decode mode applied to multichannel streams
    DecodeModeMch,
    /// DAB station name
    DabStation,
    /// FM RDS text
    RdsInformation,
    /// DAB dynamic label / programme type text
    DlsPdt,
}

impl Field {
    /// Whether the receiver only reports this field on its main zone
    pub fn is_main_zone_only(&self) -> bool {
        matches!(
            self,
            Self::IncomingAudioFormat | Self::DecodeMode2Ch | Self::DecodeModeMch
        )
    }
}

/// Request sent to a single zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Request {
    /// Ask for the current value of a field
    Query(Field),

    /// Leave or enter standby
    SetPower { on: bool },

    /// Set an absolute volume (0..=99)
    SetVolume { volume: u8 },

    /// Raise volume by one step
    IncVolume,

    /// Lower volume by one step
    DecVolume,

    /// Mute or unmute
    SetMute { mute: bool },

    /// Select an input
    SetSource { source: SourceCode },

    /// Select a 2-channel decode mode
    SetDecodeMode2Ch { mode: DecodeMode2Ch },

    /// Select a multichannel decode mode
    SetDecodeModeMch { mode: DecodeModeMch },
}

impl Request {
    /// The field this request reads or changes
    pub fn field(&self) -> Field {
        match self {
            Self::Query(field) => *field,
            Self::SetPower { .. } => Field::Power,
            Self::SetVolume { .. } | Self::IncVolume | Self::DecVolume => Field::Volume,
            Self::SetMute { .. } => Field::Mute,
            Self::SetSource { .. } => Field::Source,
            Self::SetDecodeMode2Ch { .. } => Field::DecodeMode2Ch,
            Self::SetDecodeModeMch { .. } => Field::DecodeModeMch,
        }
    }
}

/// A value reported by the receiver for one zone
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Report {
    /// Power state
    Power { on: bool },

    /// Volume in device steps
    Volume { volume: u8 },

    /// Mute state
    Mute { mute: bool },

    /// Selected input
    Source { source: SourceCode },

    /// Format of the incoming stream
    IncomingAudioFormat { format: IncomingAudioFormat },

    /// Active 2-channel decode mode
    DecodeMode2Ch { mode: DecodeMode2Ch },

    /// Active multichannel decode mode
    DecodeModeMch { mode: DecodeModeMch },

    /// DAB station name
    DabStation { name: String },

    /// FM RDS text
    RdsInformation { text: String },

    /// DAB DLS/PDT text
    DlsPdt { text: String },
}

impl Report {
    /// The field this report carries a value for
    pub fn field(&self) -> Field {
        match self {
            Self::Power { .. } => Field::Power,
            Self::Volume { .. } => Field::Volume,
            Self::Mute { .. } => Field::Mute,
            Self::Source { .. } => Field::Source,
            Self::IncomingAudioFormat { .. } => Field::IncomingAudioFormat,
            Self::DecodeMode2Ch { .. } => Field::DecodeMode2Ch,
            Self::DecodeModeMch { .. } => Field::DecodeModeMch,
            Self::DabStation { .. } => Field::DabStation,
            Self::RdsInformation { .. } => Field::RdsInformation,
            Self::DlsPdt { .. } => Field::DlsPdt,
        }
    }
}

/// An unsolicited report received from the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Zone the report belongs to
    pub zone: Zone,
    /// Reported value
    pub report: Report,
}

impl Frame {
    /// Create a frame for `zone`
    pub fn new(zone: Zone, report: Report) -> Self {
        Self { zone, report }
    }
}
