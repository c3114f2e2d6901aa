//! Per-link lifecycle events
//!
//! Each receiver link has its own [`EventChannel`]. The supervisor publishes
//! connection lifecycle and incoming data on it; every zone controller of that
//! receiver holds a subscription. Events carry the link identity so observers
//! watching several receivers can tell them apart.

use fmj_protocol::{Frame, LinkId};
use tokio::sync::broadcast;

/// Capacity of a link's event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Lifecycle and data events for one receiver link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link connected; cached state must be re-read
    Started {
        /// Link that connected
        link: LinkId,
    },

    /// The link closed; cached state is stale until the next `Started`
    Stopped {
        /// Link that closed
        link: LinkId,
    },

    /// The receiver sent an unsolicited report
    Data {
        /// Link the report arrived on
        link: LinkId,
        /// The report and the zone it belongs to
        frame: Frame,
    },
}

impl LinkEvent {
    /// Link this event belongs to
    pub fn link(&self) -> &LinkId {
        match self {
            LinkEvent::Started { link }
            | LinkEvent::Stopped { link }
            | LinkEvent::Data { link, .. } => link,
        }
    }

    /// Check if this is a connection lifecycle event
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, LinkEvent::Started { .. } | LinkEvent::Stopped { .. })
    }
}

/// Broadcast channel carrying the events of one link
///
/// Cloning yields another publishing handle for the same channel. Subscribers
/// see the channel close once every publishing handle is dropped.
#[derive(Debug, Clone)]
pub struct EventChannel {
    link: LinkId,
    tx: broadcast::Sender<LinkEvent>,
}

impl EventChannel {
    /// Create a channel for `link`
    pub fn new(link: LinkId) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { link, tx }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub(crate) fn started(&self) {
        self.publish(LinkEvent::Started {
            link: self.link.clone(),
        });
    }

    pub(crate) fn stopped(&self) {
        self.publish(LinkEvent::Stopped {
            link: self.link.clone(),
        });
    }

    pub(crate) fn data(&self, frame: Frame) {
        self.publish(LinkEvent::Data {
            link: self.link.clone(),
            frame,
        });
    }

    fn publish(&self, event: LinkEvent) {
        // No subscribers is fine: nobody is interested in this link yet
        let _ = self.tx.send(event);
    }
}
