//! Error types for registry coordination operations.
//!
//! Consumers get typed variants so they can tell a missing node apart from
//! transport trouble without depending on ZooKeeper client internals.

use thiserror::Error;

/// Top-level error type for the zk-coordination crate.
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// Session or transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Operation timed out before the server answered.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The requested node does not exist.
    #[error("no node at {path}")]
    NoNode { path: String },
}

impl CoordinationError {
    /// Returns true if this error reports a missing node.
    pub fn is_no_node(&self) -> bool {
        matches!(self, CoordinationError::NoNode { .. })
    }
}

/// Shorthand result alias for coordination operations.
pub type CoordinationResult<T> = Result<T, CoordinationError>;
