//! Error types for the bridge

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by zone commands
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Source name is not one the receiver knows
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// Sound mode name is not in the decode-mode set currently in effect
    #[error("unknown sound mode: {0}")]
    UnknownSoundMode(String),

    /// The zone has no way to perform the operation
    #[error("{0} is not supported by this zone")]
    CapabilityUnsupported(&'static str),

    /// The host failed to carry out a delegated action
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Errors reported by the host
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// A configured action could not be invoked
    #[error("action {service} failed: {message}")]
    ActionFailed {
        /// Service the action targets
        service: String,
        /// Failure reason
        message: String,
    },
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid JSON or has the wrong shape
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Receiver host is empty
    #[error("receiver host must not be empty")]
    MissingHost,

    /// Port 0 was configured
    #[error("port must be between 1 and 65535")]
    InvalidPort,

    /// Zone number other than 1 or 2
    #[error("invalid zone {0}: the receiver has zones 1 and 2")]
    InvalidZone(u8),

    /// No zones configured
    #[error("at least one zone must be configured")]
    NoZones,

    /// Scan interval of zero seconds
    #[error("scan interval must be at least one second")]
    InvalidInterval,
}
