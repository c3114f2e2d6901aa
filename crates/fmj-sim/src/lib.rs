//! Arcam FMJ Receiver Simulation
//!
//! This crate provides a simulated receiver for exercising the bridge
//! without physical hardware:
//!
//! - **VirtualReceiver**: an in-memory [`Link`](fmj_protocol::Link) that keeps
//!   per-zone state, answers requests the way the receiver does, and emits
//!   unsolicited frames when its "front panel" is used
//! - **ConnectBehavior**: scripted outcomes for connection attempts, for
//!   driving reconnect scenarios (refusals, hangs, dropped connections)
//!
//! # Example
//!
//! ```rust
//! use fmj_protocol::{Link, LinkId, Report, Request, SourceCode, Zone};
//! use fmj_sim::VirtualReceiver;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let receiver = VirtualReceiver::new(LinkId::new("sim", 50000));
//! receiver.connect().await.unwrap();
//!
//! let report = receiver
//!     .request(Zone::Main, Request::SetSource { source: SourceCode::Dab })
//!     .await
//!     .unwrap();
//! assert_eq!(report, Some(Report::Source { source: SourceCode::Dab }));
//! # }
//! ```

pub mod receiver;

pub use receiver::{
    ConnectBehavior, VirtualReceiver, VirtualReceiverConfig, ZoneModel, FRAME_CHANNEL_CAPACITY,
};
