//! Connection supervision
//!
//! The [`Supervisor`] owns the connection lifecycle of one receiver link. It
//! connects, forwards everything the receiver sends as [`LinkEvent::Data`],
//! and reconnects forever after failures:
//!
//! - **Connection failure** (refused, dropped, closed): wait one retry
//!   interval, then try again
//! - **Timeout** (no connection within one retry interval): try again at once
//! - **Lag** (frames lost because forwarding fell behind): close and
//!   reconnect at once, so the new `Started` makes every zone re-read its state
//!
//! Every connection epoch is bracketed by exactly one `Started` and one
//! `Stopped` event. The link is closed on every exit path, including
//! shutdown, before `Stopped` is published.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use fmj_bridge::{EventChannel, Supervisor};
//!
//! let channel = EventChannel::new(link.id().clone());
//! let mut events = channel.subscribe();
//! let handle = Supervisor::new(link, channel, Duration::from_secs(5)).spawn();
//!
//! // ... later, on host shutdown
//! handle.shutdown().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use fmj_protocol::{Frame, Link, LinkError, LinkId};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::events::EventChannel;
use crate::state::ConnectionState;

/// How a connection attempt ended
#[derive(Debug)]
enum Outcome {
    /// Shutdown was requested
    Shutdown,
    /// No connection within the retry interval
    TimedOut,
    /// Frames were lost; the mirrored state can no longer be trusted
    Lagged(u64),
    /// Connection refused, lost, or closed
    Failed(LinkError),
}

impl Outcome {
    fn from_error(error: LinkError) -> Self {
        if error.is_connection_failure() {
            Outcome::Failed(error)
        } else {
            Outcome::TimedOut
        }
    }
}

/// Keeps one receiver link connected and publishes its lifecycle
pub struct Supervisor {
    link: Arc<dyn Link>,
    events: EventChannel,
    retry_interval: Duration,
    state: watch::Sender<ConnectionState>,
}

impl Supervisor {
    /// Create a supervisor for `link`, publishing on `events`
    ///
    /// `retry_interval` bounds each connection attempt and is the pause
    /// between attempts after a connection failure.
    pub fn new(link: Arc<dyn Link>, events: EventChannel, retry_interval: Duration) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            link,
            events,
            retry_interval,
            state,
        }
    }

    /// Run the supervisor as a task
    ///
    /// The returned handle is the only way to stop it.
    pub fn spawn(self) -> SupervisorHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let link = self.link.id().clone();
        let state = self.state.subscribe();
        let task = tokio::spawn(self.run(shutdown_rx));
        SupervisorHandle {
            link,
            shutdown_tx,
            task,
            state,
        }
    }

    /// Connect, process and reconnect until `shutdown` fires
    ///
    /// A dropped shutdown sender counts as a shutdown request.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        info!("Supervising receiver link {}", self.link.id());

        loop {
            match self.run_once(&mut shutdown).await {
                Outcome::Shutdown => break,
                Outcome::TimedOut => {
                    debug!(
                        "Connecting to {} timed out after {:?}, retrying",
                        self.link.id(),
                        self.retry_interval
                    );
                }
                Outcome::Lagged(skipped) => {
                    warn!(
                        "Lost {} frames from {}, reconnecting to resynchronize",
                        skipped,
                        self.link.id()
                    );
                }
                Outcome::Failed(e) => {
                    debug!(
                        "Link {} failed: {}; retrying in {:?}",
                        self.link.id(),
                        e,
                        self.retry_interval
                    );
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(self.retry_interval) => {}
                    }
                }
            }
        }

        info!("Supervisor for {} stopped", self.link.id());
    }

    /// One connection epoch: connect, then process until the link goes away
    async fn run_once(&self, shutdown: &mut oneshot::Receiver<()>) -> Outcome {
        self.state.send_replace(ConnectionState::Connecting);

        let connected = tokio::select! {
            _ = &mut *shutdown => None,
            result = tokio::time::timeout(self.retry_interval, self.link.connect()) => Some(result),
        };

        let outcome = match connected {
            None => Outcome::Shutdown,
            Some(Err(_elapsed)) => Outcome::TimedOut,
            Some(Ok(Err(e))) => Outcome::from_error(e),
            Some(Ok(Ok(()))) => return self.serve(shutdown).await,
        };

        self.cleanup(false).await;
        outcome
    }

    /// Publish the connection and forward frames until the link closes
    async fn serve(&self, shutdown: &mut oneshot::Receiver<()>) -> Outcome {
        info!("Client connected {}", self.link.id());
        self.state.send_replace(ConnectionState::Connected);

        // Listen before announcing so no frame of this epoch is missed
        let mut frames = self.link.listen();
        self.events.started();

        let outcome = tokio::select! {
            _ = &mut *shutdown => Outcome::Shutdown,
            outcome = self.pump(&mut frames) => outcome,
        };

        drop(frames);
        self.cleanup(true).await;
        outcome
    }

    /// Drive `process()` while forwarding every received frame
    ///
    /// Ends the epoch as soon as a frame is lost.
    async fn pump(&self, frames: &mut broadcast::Receiver<Frame>) -> Outcome {
        let process = self.link.process();
        tokio::pin!(process);
        let mut listening = true;

        loop {
            tokio::select! {
                // Frames already received are forwarded before the close is observed
                biased;

                frame = frames.recv(), if listening => match frame {
                    Ok(frame) => {
                        debug!("Frame from {}: {:?}", self.link.id(), frame);
                        self.events.data(frame);
                    }
                    Err(RecvError::Lagged(skipped)) => return Outcome::Lagged(skipped),
                    Err(RecvError::Closed) => listening = false,
                },

                result = &mut process => {
                    return match result {
                        Ok(()) => Outcome::Failed(LinkError::ConnectionFailed(
                            "connection closed".to_string(),
                        )),
                        Err(e) => Outcome::from_error(e),
                    };
                }
            }
        }
    }

    /// Release the link; runs on every exit path of an epoch
    async fn cleanup(&self, started: bool) {
        self.link.close().await;
        self.state.send_replace(ConnectionState::Disconnected);

        if started {
            info!("Client disconnected {}", self.link.id());
            self.events.stopped();
        }
    }
}

/// Handle to a running supervisor
///
/// Dropping the handle stops the supervisor without waiting for it.
pub struct SupervisorHandle {
    link: LinkId,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
    state: watch::Receiver<ConnectionState>,
}

impl SupervisorHandle {
    /// Identity of the supervised link
    pub fn link_id(&self) -> &LinkId {
        &self.link
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch connection state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Stop the supervisor and wait until the link is closed
    ///
    /// An attempt in flight is interrupted; when a connection was up,
    /// `Stopped` has been published by the time this returns.
    pub async fn shutdown(self) {
        let SupervisorHandle {
            link,
            shutdown_tx,
            task,
            ..
        } = self;

        debug!("Shutting down supervisor for {}", link);
        let _ = shutdown_tx.send(());
        if let Err(e) = task.await {
            warn!("Supervisor task for {} ended abnormally: {}", link, e);
        }
    }
}
