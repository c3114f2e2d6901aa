//! Arcam FMJ Receiver Vocabulary
//!
//! This crate describes what can be said to and heard from an Arcam FMJ AV
//! receiver, without committing to how it is said on the wire:
//!
//! - **Codes**: input sources, incoming audio formats and the two disjoint
//!   decode-mode sets (2-channel and multichannel), each with its
//!   device-native byte code and the name shown to users
//! - **Zones**: the receiver's independently controllable zones (1 and 2)
//! - **Requests/Reports**: normalized queries and commands sent to a zone,
//!   and the values the receiver reports back, solicited or not
//! - **Link**: the contract a receiver connection fulfils
//!
//! # Example
//!
//! ```rust
//! use fmj_protocol::{DecodeMode2Ch, IncomingAudioFormat, SourceCode};
//!
//! let source = SourceCode::from_name("DAB").unwrap();
//! assert_eq!(source.code(), 0x0C);
//! assert!(SourceCode::from_name("BOGUS").is_none());
//!
//! assert!(IncomingAudioFormat::is_two_channel(Some(IncomingAudioFormat::Pcm)));
//! assert!(IncomingAudioFormat::is_two_channel(None));
//! assert_eq!(DecodeMode2Ch::Stereo.name(), "STEREO");
//! ```

pub mod codes;
pub mod command;
pub mod error;
pub mod link;

pub use codes::{DecodeMode2Ch, DecodeModeMch, IncomingAudioFormat, SourceCode, Zone};
pub use command::{Field, Frame, Report, Request, MAX_VOLUME};
pub use error::LinkError;
pub use link::{Link, LinkId, DEFAULT_PORT};
