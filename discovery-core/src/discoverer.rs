//! Broker discovery: watcher, parser, selector and renderer composed.

use tracing::{debug, info};
use zk_coordination::Connector;

use crate::{
    broker::{broker_id_from_path, BrokerDescriptor, EntryParser, JsonEntryParser},
    connection_string,
    error::{DiscoveryError, DiscoveryResult},
    selector::{select_top, DEFAULT_BROKER_LIMIT},
    watcher::{Lifecycle, RegistryWatcher},
};

/// Where Kafka brokers register themselves.
pub const DEFAULT_REGISTRY_PATH: &str = "/brokers/ids";

/// Immutable settings for a [`Discoverer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    target: String,
    registry_path: String,
    limit: usize,
}

impl DiscoveryConfig {
    /// Settings for the registry at `host:port`.
    ///
    /// Absent or blank values and ports that are not a valid TCP port are
    /// rejected with [`DiscoveryError::InvalidArgument`].
    pub fn new(host: Option<&str>, port: Option<&str>) -> DiscoveryResult<Self> {
        let host = required("host", host)?;
        let port = required("port", port)?;
        port.parse::<u16>().map_err(|err| {
            DiscoveryError::InvalidArgument(format!("port '{port}' is not a valid port: {err}"))
        })?;
        Ok(Self {
            target: format!("{host}:{port}"),
            registry_path: DEFAULT_REGISTRY_PATH.to_owned(),
            limit: DEFAULT_BROKER_LIMIT,
        })
    }

    /// Watch a different registry path, e.g. under a chroot.
    pub fn with_registry_path(mut self, path: impl Into<String>) -> DiscoveryResult<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(DiscoveryError::InvalidArgument(format!(
                "registry path '{path}' must be absolute"
            )));
        }
        self.registry_path = path;
        Ok(self)
    }

    /// Cap the number of brokers selected.
    pub fn with_limit(mut self, limit: usize) -> DiscoveryResult<Self> {
        if limit == 0 {
            return Err(DiscoveryError::InvalidArgument(
                "broker limit must be at least 1".into(),
            ));
        }
        self.limit = limit;
        Ok(self)
    }

    /// `host:port` of the registry.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Registry path holding broker registrations.
    pub fn registry_path(&self) -> &str {
        &self.registry_path
    }

    /// Maximum number of brokers selected.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> DiscoveryResult<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(DiscoveryError::InvalidArgument(format!(
            "registry {name} is required"
        ))),
    }
}

/// Discovers live brokers and renders them as a bootstrap string.
///
/// Construction performs one eager fetch; [`connection_string`] renders what
/// that fetch captured and never goes back to the registry.
///
/// [`connection_string`]: Discoverer::connection_string
#[derive(Debug)]
pub struct Discoverer<K: Connector, P: EntryParser = JsonEntryParser> {
    watcher: RegistryWatcher<K>,
    parser: P,
    limit: usize,
    brokers: Vec<BrokerDescriptor>,
}

impl<K: Connector> Discoverer<K> {
    /// Connect with the default JSON registration parser.
    pub async fn connect(config: DiscoveryConfig, connector: K) -> DiscoveryResult<Self> {
        Self::with_parser(config, connector, JsonEntryParser).await
    }
}

impl<K: Connector, P: EntryParser> Discoverer<K, P> {
    /// Connect using `parser` for registration payloads.
    ///
    /// Fails with whatever the eager fetch fails with; the watcher is
    /// released before returning the error.
    pub async fn with_parser(
        config: DiscoveryConfig,
        connector: K,
        parser: P,
    ) -> DiscoveryResult<Self> {
        let DiscoveryConfig {
            target,
            registry_path,
            limit,
        } = config;
        let mut discoverer = Self {
            watcher: RegistryWatcher::new(connector, target, registry_path),
            parser,
            limit,
            brokers: Vec::new(),
        };
        match discoverer.fetch().await {
            Ok(brokers) => {
                discoverer.brokers = brokers;
                Ok(discoverer)
            }
            Err(err) => {
                discoverer.watcher.close().await;
                Err(err)
            }
        }
    }

    /// Take a fresh snapshot of the registry and select brokers from it.
    ///
    /// One malformed registration fails the whole fetch. The list captured at
    /// construction is left untouched.
    pub async fn fetch(&mut self) -> DiscoveryResult<Vec<BrokerDescriptor>> {
        let children = self.watcher.fetch_children().await?;
        let registered = children.len();

        let brokers = children
            .iter()
            .map(|child| -> DiscoveryResult<BrokerDescriptor> {
                let broker = self.parser.parse(child.data.as_deref())?;
                Ok(broker.with_id(broker_id_from_path(&child.path)?))
            })
            .collect::<DiscoveryResult<Vec<_>>>()?;

        let selected = select_top(brokers, self.limit);
        debug!(
            registered,
            selected = ?selected.iter().map(|b| b.id).collect::<Vec<_>>(),
            "selected brokers"
        );
        Ok(selected)
    }

    /// Brokers captured at construction, ascending by id.
    pub fn brokers(&self) -> &[BrokerDescriptor] {
        &self.brokers
    }

    /// Bootstrap string for the brokers captured at construction, `None` if
    /// no broker was registered.
    pub fn connection_string(&self) -> Option<String> {
        let rendered = connection_string::build(&self.brokers);
        info!(
            brokers = self.brokers.len(),
            connection_string = ?rendered,
            "rendered connection string"
        );
        rendered
    }

    /// Lifecycle of the underlying registry watcher.
    pub fn lifecycle(&self) -> Lifecycle {
        self.watcher.lifecycle()
    }

    /// Release the registry session. Safe to call more than once.
    pub async fn close(&mut self) {
        self.watcher.close().await;
    }
}
