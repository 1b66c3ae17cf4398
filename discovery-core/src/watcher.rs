//! Lazy, one-shot registry watching.
//!
//! A [`RegistryWatcher`] owns its registry session through an explicit
//! lifecycle. The client and children cache only exist inside the
//! `Connected` state, so there is no flag to get out of sync with the
//! resources it is meant to describe.
//!
//! ```text
//! Uninitialized --fetch ok--> Connected --close--> Closed
//!       |  ^                     |  ^
//!       +--+ fetch failed        +--+ fetch (cache reused)
//! ```
//!
//! Nothing restores `Connected` once `Closed`.

use std::fmt;

use tracing::{debug, info};
use zk_coordination::{
    ChildData, ChildrenCache, Connector, CoordinationClient, CoordinationError,
};

use crate::error::{DiscoveryError, DiscoveryResult};

type ClientOf<K> = <K as Connector>::Client;
type CacheOf<K> = <ClientOf<K> as CoordinationClient>::Cache;

/// Observable lifecycle of a [`RegistryWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No session held. The next fetch connects.
    Uninitialized,
    /// Session and children cache are live.
    Connected,
    /// Released. Fetches fail with [`DiscoveryError::WatcherClosed`].
    Closed,
}

enum State<K: Connector> {
    Uninitialized,
    Connected {
        client: ClientOf<K>,
        cache: CacheOf<K>,
    },
    Closed,
}

/// Watches the children of one registry path.
pub struct RegistryWatcher<K: Connector> {
    connector: K,
    target: String,
    path: String,
    state: State<K>,
}

impl<K: Connector> RegistryWatcher<K> {
    /// Create a watcher for `path` on the registry at `target`. Nothing is
    /// opened until the first [`fetch_children`].
    ///
    /// [`fetch_children`]: RegistryWatcher::fetch_children
    pub fn new(connector: K, target: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            connector,
            target: target.into(),
            path: path.into(),
            state: State::Uninitialized,
        }
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        match self.state {
            State::Uninitialized => Lifecycle::Uninitialized,
            State::Connected { .. } => Lifecycle::Connected,
            State::Closed => Lifecycle::Closed,
        }
    }

    /// Snapshot of the registry path's children.
    ///
    /// The first call connects, checks that the path exists and builds the
    /// children cache before returning. Later calls read the live cache
    /// without reconnecting. If initialization fails the session is released
    /// and the watcher stays `Uninitialized`, so a later call retries from
    /// scratch.
    pub async fn fetch_children(&mut self) -> DiscoveryResult<Vec<ChildData>> {
        match &self.state {
            State::Connected { cache, .. } => return Ok(cache.current_data()),
            State::Closed => return Err(DiscoveryError::WatcherClosed),
            State::Uninitialized => {}
        }

        let (client, cache) = self.initialize().await?;
        let children = cache.current_data();
        self.state = State::Connected { client, cache };
        Ok(children)
    }

    /// Release the children cache and the session.
    ///
    /// Idempotent: closing an already closed watcher does nothing, and
    /// closing one that never connected just moves it to `Closed`.
    pub async fn close(&mut self) {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Connected { client, cache } => {
                cache.close().await;
                client.close().await;
                info!(path = %self.path, "registry watcher closed");
            }
            State::Uninitialized => {
                debug!(path = %self.path, "closing registry watcher that never connected");
            }
            State::Closed => {
                debug!(path = %self.path, "registry watcher already closed");
            }
        }
    }

    async fn initialize(&self) -> DiscoveryResult<(ClientOf<K>, CacheOf<K>)> {
        debug!(registry = %self.target, path = %self.path, "initializing registry watcher");
        let client = self.connector.connect(&self.target).await?;
        match self.start_cache(&client).await {
            Ok(cache) => {
                info!(registry = %self.target, path = %self.path, "watching registry");
                Ok((client, cache))
            }
            Err(err) => {
                client.close().await;
                Err(err)
            }
        }
    }

    async fn start_cache(&self, client: &ClientOf<K>) -> DiscoveryResult<CacheOf<K>> {
        let exists = client
            .exists(&self.path)
            .await
            .map_err(|err| self.registry_error(err))?;
        if !exists {
            return Err(self.unavailable());
        }
        client
            .watch_children(&self.path)
            .await
            .map_err(|err| self.registry_error(err))
    }

    fn registry_error(&self, err: CoordinationError) -> DiscoveryError {
        if err.is_no_node() {
            self.unavailable()
        } else {
            DiscoveryError::Connection(err)
        }
    }

    fn unavailable(&self) -> DiscoveryError {
        DiscoveryError::RegistryUnavailable {
            path: self.path.clone(),
        }
    }
}

impl<K: Connector> fmt::Debug for RegistryWatcher<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryWatcher")
            .field("connector", &self.connector)
            .field("target", &self.target)
            .field("path", &self.path)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
