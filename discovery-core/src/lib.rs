//! # discovery-core
//!
//! Finds the live brokers of a Kafka cluster from their registrations under
//! a ZooKeeper path and renders a bounded, id-ordered bootstrap string.
//!
//! ```text
//! Discoverer -> RegistryWatcher::fetch_children -> EntryParser::parse (each)
//!            -> id from path -> select_top(limit) -> connection_string::build
//! ```
#![warn(
    missing_debug_implementations,
    missing_docs,
    missing_copy_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![allow(clippy::cognitive_complexity)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
pub use anyhow;
pub use chrono;
pub use tokio;
pub use tracing;
pub use zk_coordination;

pub use crate::{
    broker::{broker_id_from_path, BrokerDescriptor, EntryParser, JsonEntryParser},
    discoverer::{Discoverer, DiscoveryConfig, DEFAULT_REGISTRY_PATH},
    error::{DiscoveryError, DiscoveryResult},
    selector::{select_top, DEFAULT_BROKER_LIMIT},
    watcher::{Lifecycle, RegistryWatcher},
};

pub mod broker;
pub mod config;
pub mod connection_string;
pub mod discoverer;
pub mod error;
pub mod selector;
pub mod watcher;
