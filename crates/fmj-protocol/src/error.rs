//! Error types for receiver links

use thiserror::Error;

/// Errors reported by a receiver link
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The receiver could not be reached, or the connection was lost
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// No answer within the allotted time
    #[error("timed out waiting for receiver")]
    Timeout,

    /// The receiver sent something that could not be understood
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A request was issued while the link is down
    #[error("link is not connected")]
    NotConnected,
}

impl LinkError {
    /// Whether this error means the connection itself is gone
    ///
    /// Connection-level failures are retried after a pause; timeouts are
    /// retried right away.
    pub fn is_connection_failure(&self) -> bool {
        !matches!(self, LinkError::Timeout)
    }
}
