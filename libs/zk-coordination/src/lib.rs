//! # zk-coordination
//!
//! Coordination-registry access for broker discovery, backed by ZooKeeper.
//!
//! This library provides:
//! - **Capability traits** ([`Connector`], [`CoordinationClient`],
//!   [`ChildrenCache`]) so callers depend on what a registry can do rather
//!   than on a concrete client. Tests substitute in-memory fakes.
//! - **ZooKeeper connector** with bounded connect attempts and exponential
//!   backoff between them.
//! - **Children cache** that builds an initial snapshot of a node's children
//!   and their payloads, then keeps it fresh from a background watch task.
//!
//! Retry and refresh live here. Callers above this crate only ever see a
//! connected client or a typed [`CoordinationError`].

pub mod cache;
pub mod client;
pub mod error;
pub mod models;
pub mod registry;

// Re-export key types for convenient access
pub use cache::ZkChildrenCache;
pub use client::{ZkClient, ZkConnector};
pub use error::{CoordinationError, CoordinationResult};
pub use models::{ChildData, child_path};
pub use registry::{ChildrenCache, Connector, CoordinationClient};
