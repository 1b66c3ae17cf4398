//! Capabilities a coordination registry must offer to the discovery pipeline.
//!
//! The traits are generic over associated types rather than boxed so a
//! watcher holding a client and its cache keeps concrete types end to end.

use std::fmt;

use async_trait::async_trait;

use crate::error::CoordinationResult;
use crate::models::ChildData;

/// Opens sessions against a registry.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    /// Client produced by a successful connect.
    type Client: CoordinationClient;

    /// Open a session against `target` (`host:port[,host:port...]`).
    ///
    /// Any retry or backoff happens inside this call.
    async fn connect(&self, target: &str) -> CoordinationResult<Self::Client>;
}

/// A connected registry session.
#[async_trait]
pub trait CoordinationClient: Send + Sync + fmt::Debug + 'static {
    /// Cache type returned by [`watch_children`].
    ///
    /// [`watch_children`]: CoordinationClient::watch_children
    type Cache: ChildrenCache;

    /// Returns whether a node exists at `path`.
    async fn exists(&self, path: &str) -> CoordinationResult<bool>;

    /// Start a children cache for `path`.
    ///
    /// Does not return until the cache holds a first consistent snapshot.
    async fn watch_children(&self, path: &str) -> CoordinationResult<Self::Cache>;

    /// Release the session.
    async fn close(self);
}

/// Locally maintained mirror of a node's children and their payloads.
#[async_trait]
pub trait ChildrenCache: Send + Sync + fmt::Debug + 'static {
    /// Snapshot of the cached children, ordered by path.
    fn current_data(&self) -> Vec<ChildData>;

    /// Stop refreshing and drop cached state.
    async fn close(self);
}
