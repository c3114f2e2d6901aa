//! Receiver link contract
//!
//! A [`Link`] is one connection to one physical receiver. It is shared by
//! every zone of that receiver: the supervisor drives its connection
//! lifecycle while zone controllers issue requests through it.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::codes::Zone;
use crate::command::{Frame, Report, Request};
use crate::error::LinkError;

/// Default TCP port of the receiver's control interface
pub const DEFAULT_PORT: u16 = 50000;

/// Identity of a receiver connection (host and port)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkId {
    /// Host name or address of the receiver
    pub host: String,
    /// Control port
    pub port: u16,
}

impl LinkId {
    /// Create a link identity
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A connection to a receiver
///
/// Implementations own the wire protocol and request/response correlation;
/// callers only see normalized [`Request`]s and [`Report`]s.
#[async_trait]
pub trait Link: Send + Sync + 'static {
    /// Identity of this link
    fn id(&self) -> &LinkId;

    /// Whether the link is currently connected
    fn is_connected(&self) -> bool;

    /// Open the connection
    async fn connect(&self) -> Result<(), LinkError>;

    /// Close the connection; a no-op when already closed
    async fn close(&self);

    /// Register a listener for unsolicited frames
    ///
    /// Dropping the receiver unregisters the listener.
    fn listen(&self) -> broadcast::Receiver<Frame>;

    /// Read and dispatch incoming data until the connection closes
    ///
    /// Returns `Ok(())` when the connection was closed locally and an error
    /// when it failed or was dropped by the receiver.
    async fn process(&self) -> Result<(), LinkError>;

    /// Send a request to a zone and wait for the receiver's answer
    ///
    /// `Ok(None)` means the receiver answered that the value is not
    /// available or the command is not supported for that zone.
    async fn request(&self, zone: Zone, request: Request) -> Result<Option<Report>, LinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_id_display() {
        let id = LinkId::new("192.168.1.20", DEFAULT_PORT);
        assert_eq!(id.to_string(), "192.168.1.20:50000");
    }

    #[test]
    fn test_link_id_equality() {
        assert_eq!(LinkId::new("avr", 50000), LinkId::new("avr", 50000));
        assert_ne!(LinkId::new("avr", 50000), LinkId::new("avr", 50001));
    }
}
