//! In-memory registry standing in for ZooKeeper.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use discovery_core::zk_coordination::{
    ChildData, ChildrenCache, Connector, CoordinationClient, CoordinationError,
    CoordinationResult,
};
use parking_lot::Mutex;

pub const BROKERS_PATH: &str = "/brokers/ids";

/// Shared registry state. Children keep insertion order so tests control the
/// order the cache hands them out in.
#[derive(Debug, Default)]
pub struct Registry {
    path_exists: AtomicBool,
    refuse_connections: AtomicBool,
    children: Mutex<Vec<ChildData>>,
    connects: AtomicUsize,
    client_closes: AtomicUsize,
    cache_closes: AtomicUsize,
}

impl Registry {
    /// Registry with the brokers path present and no children.
    pub fn new() -> Arc<Self> {
        let registry = Self::default();
        registry.path_exists.store(true, Ordering::SeqCst);
        Arc::new(registry)
    }

    /// Registry without the brokers path.
    pub fn without_path() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn create_path(&self) {
        self.path_exists.store(true, Ordering::SeqCst);
    }

    pub fn refuse_connections(&self) {
        self.refuse_connections.store(true, Ordering::SeqCst);
    }

    /// Register broker `id` with a well-formed payload.
    pub fn register(&self, id: i32, host: &str, port: i32) {
        self.register_raw(id, Some(payload(host, port)));
    }

    /// Register broker `id` with an arbitrary payload.
    pub fn register_raw(&self, id: i32, data: Option<Vec<u8>>) {
        self.register_at(&id.to_string(), data);
    }

    /// Add a child node named `name` under the brokers path.
    pub fn register_at(&self, name: &str, data: Option<Vec<u8>>) {
        self.children
            .lock()
            .push(ChildData::new(format!("{BROKERS_PATH}/{name}"), data));
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn cache_closes(&self) -> usize {
        self.cache_closes.load(Ordering::SeqCst)
    }

    /// Sessions opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.connects() - self.client_closes.load(Ordering::SeqCst)
    }

    pub fn connector(self: &Arc<Self>) -> FakeConnector {
        FakeConnector(Arc::clone(self))
    }
}

pub fn payload(host: &str, port: i32) -> Vec<u8> {
    format!(
        r#"{{ "host":"{host}", "jmx_port":-1, "port":{port}, "timestamp":"1424095336398", "version":1 }}"#
    )
    .into_bytes()
}

#[derive(Debug, Clone)]
pub struct FakeConnector(Arc<Registry>);

#[derive(Debug)]
pub struct FakeClient(Arc<Registry>);

/// Reads the registry live, like a cache kept fresh by watches.
#[derive(Debug)]
pub struct FakeCache(Arc<Registry>);

#[async_trait]
impl Connector for FakeConnector {
    type Client = FakeClient;

    async fn connect(&self, target: &str) -> CoordinationResult<FakeClient> {
        if self.0.refuse_connections.load(Ordering::SeqCst) {
            return Err(CoordinationError::Transport(format!(
                "connection to '{target}' refused"
            )));
        }
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(FakeClient(Arc::clone(&self.0)))
    }
}

#[async_trait]
impl CoordinationClient for FakeClient {
    type Cache = FakeCache;

    async fn exists(&self, _path: &str) -> CoordinationResult<bool> {
        Ok(self.0.path_exists.load(Ordering::SeqCst))
    }

    async fn watch_children(&self, path: &str) -> CoordinationResult<FakeCache> {
        if !self.0.path_exists.load(Ordering::SeqCst) {
            return Err(CoordinationError::NoNode {
                path: path.to_owned(),
            });
        }
        Ok(FakeCache(Arc::clone(&self.0)))
    }

    async fn close(self) {
        self.0.client_closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChildrenCache for FakeCache {
    fn current_data(&self) -> Vec<ChildData> {
        self.0.children.lock().clone()
    }

    async fn close(self) {
        self.0.cache_closes.fetch_add(1, Ordering::SeqCst);
    }
}
