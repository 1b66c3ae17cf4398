//! ZooKeeper connection setup with bounded attempts and backoff.
//!
//! Wraps `zookeeper-client` so the rest of the workspace only sees the
//! [`Connector`] and [`CoordinationClient`] capabilities and typed errors.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use zookeeper_client as zk;

use crate::cache::ZkChildrenCache;
use crate::error::{CoordinationError, CoordinationResult};
use crate::registry::{Connector, CoordinationClient};

/// Default bound on a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default number of extra connect attempts after the first one fails.
pub const DEFAULT_CONNECT_RETRY_MAX: u32 = 3;

/// Base delay for retrying initial connections.
const CONNECT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for retry backoff during initial connect.
const MAX_CONNECT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Opens ZooKeeper sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZkConnector {
    connect_timeout: Duration,
    connect_retry_max: u32,
}

impl Default for ZkConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_CONNECT_RETRY_MAX)
    }
}

impl ZkConnector {
    /// Create a connector.
    ///
    /// `connect_retry_max` counts retries, so the connector makes at most
    /// `connect_retry_max + 1` attempts.
    pub fn new(connect_timeout: Duration, connect_retry_max: u32) -> Self {
        Self {
            connect_timeout,
            connect_retry_max,
        }
    }

    /// Bound on a single connect attempt.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Number of retries after the first failed attempt.
    pub fn connect_retry_max(&self) -> u32 {
        self.connect_retry_max
    }

    /// Delay before retry number `attempt` (zero based).
    fn retry_delay(attempt: u32) -> Duration {
        CONNECT_RETRY_BASE_DELAY
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(MAX_CONNECT_RETRY_DELAY)
    }

    async fn try_connect(&self, target: &str) -> CoordinationResult<zk::Client> {
        match tokio::time::timeout(self.connect_timeout, zk::Client::connect(target)).await {
            Ok(Ok(client)) => Ok(client),
            Ok(Err(err)) => Err(CoordinationError::Transport(format!(
                "connect to '{target}' failed: {err}"
            ))),
            Err(_) => Err(CoordinationError::Timeout(format!(
                "connect to '{target}' timed out after {:?}",
                self.connect_timeout
            ))),
        }
    }
}

#[async_trait]
impl Connector for ZkConnector {
    type Client = ZkClient;

    async fn connect(&self, target: &str) -> CoordinationResult<ZkClient> {
        info!(
            registry = target,
            connect_timeout = ?self.connect_timeout,
            connect_retry_max = self.connect_retry_max,
            "connecting to ZooKeeper"
        );

        let total_attempts = self.connect_retry_max.saturating_add(1);
        for attempt in 0..total_attempts {
            match self.try_connect(target).await {
                Ok(client) => {
                    info!(
                        attempt = attempt + 1,
                        total_attempts, "ZooKeeper session established"
                    );
                    return Ok(ZkClient::new(client));
                }
                Err(err) => {
                    let attempt_num = attempt + 1;
                    if attempt_num >= total_attempts {
                        error!(
                            attempts = total_attempts,
                            error = %err,
                            "ZooKeeper connection failed after all retry attempts"
                        );
                        return Err(CoordinationError::Transport(format!(
                            "ZooKeeper connection failed after {total_attempts} attempt(s): {err}"
                        )));
                    }

                    let delay = Self::retry_delay(attempt);
                    warn!(
                        attempt = attempt_num,
                        total_attempts,
                        retry_in_ms = delay.as_millis(),
                        error = %err,
                        "ZooKeeper connection attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        unreachable!("connect loop should return on success or terminal failure")
    }
}

/// A live ZooKeeper session.
#[derive(Clone)]
pub struct ZkClient {
    inner: zk::Client,
}

impl ZkClient {
    /// Wrap an already connected `zookeeper-client` session.
    pub fn new(inner: zk::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl CoordinationClient for ZkClient {
    type Cache = ZkChildrenCache;

    async fn exists(&self, path: &str) -> CoordinationResult<bool> {
        let stat = self
            .inner
            .check_stat(path)
            .await
            .map_err(|err| map_zk_error(path, err))?;
        debug!(path, exists = stat.is_some(), "checked node");
        Ok(stat.is_some())
    }

    async fn watch_children(&self, path: &str) -> CoordinationResult<ZkChildrenCache> {
        ZkChildrenCache::start(self.inner.clone(), path).await
    }

    async fn close(self) {
        // the session ends once the last handle is dropped
        drop(self.inner);
        info!("ZooKeeper session closed");
    }
}

impl std::fmt::Debug for ZkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZkClient").finish_non_exhaustive()
    }
}

/// Map a `zookeeper-client` error for `path` onto [`CoordinationError`].
pub(crate) fn map_zk_error(path: &str, err: zk::Error) -> CoordinationError {
    match err {
        zk::Error::NoNode => CoordinationError::NoNode {
            path: path.to_owned(),
        },
        other => CoordinationError::Transport(format!("'{path}': {other}")),
    }
}
