//! Error taxonomy for the discovery pipeline.
//!
//! Nothing in the pipeline handles these locally. Every error surfaces to the
//! immediate caller unmodified so it can match on the kind.

use thiserror::Error;
use zk_coordination::CoordinationError;

/// Errors produced while discovering brokers.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Absent or malformed constructor or parser input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The registry path did not exist when the watcher initialized.
    #[error("registry unavailable: no node at {path}")]
    RegistryUnavailable {
        /// path that was checked
        path: String,
    },

    /// Transport or session failure from the coordination client.
    #[error("connection error: {0}")]
    Connection(#[from] CoordinationError),

    /// Malformed or incomplete broker registration.
    #[error("parse error: {0}")]
    Parse(String),

    /// The watcher was closed and will not reconnect.
    #[error("registry watcher is closed")]
    WatcherClosed,
}

/// Shorthand result alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
