//! Children cache for a single ZooKeeper node.
//!
//! [`ZkChildrenCache::start`] lists the children of a path and reads every
//! child's payload before returning, so the first [`current_data`] call
//! already sees a consistent snapshot. A background task then re-arms a
//! children watch plus one data watch per child and rebuilds the snapshot
//! whenever membership or any child's payload changes.
//!
//! [`current_data`]: ChildrenCache::current_data

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, trace, warn};
use zookeeper_client as zk;

use crate::client::map_zk_error;
use crate::error::CoordinationResult;
use crate::models::{ChildData, child_path};
use crate::registry::ChildrenCache;

/// child path -> payload
type Snapshot = BTreeMap<String, Option<Vec<u8>>>;

/// A pending watch notification.
type Change<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Watches armed by one [`load`].
struct Watches {
    children: zk::OneshotWatcher,
    data: Vec<zk::OneshotWatcher>,
}

/// Children cache backed by a ZooKeeper children watch.
#[derive(Debug)]
pub struct ZkChildrenCache {
    path: String,
    snapshot: Arc<RwLock<Snapshot>>,
    refresher: Option<JoinHandle<()>>,
}

impl ZkChildrenCache {
    /// Build the initial snapshot of `path` and start refreshing it.
    pub(crate) async fn start(client: zk::Client, path: &str) -> CoordinationResult<Self> {
        let (snapshot, watches) = load(&client, path).await?;
        debug!(path, children = snapshot.len(), "built initial children cache");

        let snapshot = Arc::new(RwLock::new(snapshot));
        let refresher = tokio::spawn(refresh(
            client,
            path.to_owned(),
            Arc::clone(&snapshot),
            watches,
        ));
        Ok(Self {
            path: path.to_owned(),
            snapshot,
            refresher: Some(refresher),
        })
    }

    #[cfg(test)]
    fn from_snapshot(path: &str, snapshot: Snapshot) -> Self {
        Self {
            path: path.to_owned(),
            snapshot: Arc::new(RwLock::new(snapshot)),
            refresher: None,
        }
    }
}

#[async_trait]
impl ChildrenCache for ZkChildrenCache {
    fn current_data(&self) -> Vec<ChildData> {
        self.snapshot
            .read()
            .iter()
            .map(|(path, data)| ChildData::new(path.clone(), data.clone()))
            .collect()
    }

    async fn close(mut self) {
        if let Some(refresher) = self.refresher.take() {
            refresher.abort();
        }
        self.snapshot.write().clear();
        debug!(path = %self.path, "children cache closed");
    }
}

impl Drop for ZkChildrenCache {
    fn drop(&mut self) {
        trace!(path = %self.path, "ZkChildrenCache drop called");
        if let Some(refresher) = self.refresher.take() {
            refresher.abort();
        }
    }
}

/// List the children of `path`, read their payloads and arm a children watch
/// plus a data watch on every child read.
async fn load(client: &zk::Client, path: &str) -> CoordinationResult<(Snapshot, Watches)> {
    let (children, _, children_watch) = client
        .get_and_watch_children(path)
        .await
        .map_err(|err| map_zk_error(path, err))?;

    let mut snapshot = Snapshot::new();
    let mut data_watches = Vec::with_capacity(children.len());
    for child in children {
        let child_path = child_path(path, &child);
        match client.get_and_watch_data(&child_path).await {
            Ok((data, _, data_watch)) => {
                snapshot.insert(child_path, Some(data));
                data_watches.push(data_watch);
            }
            Err(zk::Error::NoNode) => {
                // deregistered between listing and reading
                warn!(path = %child_path, "child vanished while loading, skipping");
            }
            Err(err) => return Err(map_zk_error(&child_path, err)),
        }
    }
    Ok((
        snapshot,
        Watches {
            children: children_watch,
            data: data_watches,
        },
    ))
}

/// First notification from either the children watch or any data watch.
/// Data watches still pending when this returns are dropped.
async fn next_change<T: Send + 'static>(children: Change<T>, data: Vec<Change<T>>) -> T {
    let mut data_changes = JoinSet::new();
    for change in data {
        data_changes.spawn(change);
    }
    tokio::select! {
        event = children => event,
        Some(Ok(event)) = data_changes.join_next() => event,
    }
}

async fn refresh(
    client: zk::Client,
    path: String,
    snapshot: Arc<RwLock<Snapshot>>,
    mut watches: Watches,
) {
    loop {
        let Watches { children, data } = watches;
        let event = next_change(
            Box::pin(children.changed()),
            data.into_iter()
                .map(|watch| Box::pin(watch.changed()) as Change<zk::WatchedEvent>)
                .collect(),
        )
        .await;
        trace!(%path, event_type = ?event.event_type, node = %event.path, "watch fired");
        if matches!(event.event_type, zk::EventType::Session) {
            warn!(%path, "session event on registry watch, cache stops refreshing");
            return;
        }

        match load(&client, &path).await {
            Ok((fresh, next)) => {
                debug!(%path, children = fresh.len(), "children cache refreshed");
                *snapshot.write() = fresh;
                watches = next;
            }
            Err(err) => {
                warn!(%path, error = %err, "children cache refresh failed, keeping last snapshot");
                return;
            }
        }
    }
}
