//! discovery configs

pub mod cli {
    //! Parse from either cli or env var

    use std::time::Duration;

    pub use clap::{CommandFactory, Parser};
    use zk_coordination::{client, ZkConnector};

    use crate::{
        discoverer::{DiscoveryConfig, DEFAULT_REGISTRY_PATH},
        error::DiscoveryResult,
        selector::DEFAULT_BROKER_LIMIT,
    };

    /// default bound on one ZooKeeper connect attempt, in seconds
    pub const DEFAULT_CONNECT_TIMEOUT: u64 = client::DEFAULT_CONNECT_TIMEOUT.as_secs();
    /// default number of connect retries after the first attempt
    pub const DEFAULT_CONNECT_RETRY_MAX: u32 = client::DEFAULT_CONNECT_RETRY_MAX;
    /// default log level. Can use this argument or DISCOVERY_LOG env var
    pub const DEFAULT_DISCOVERY_LOG: &str = "info";
    /// log as "json", "pretty" or "standard" (unstructured)
    pub const DEFAULT_LOG_FORMAT: &str = "standard";

    #[derive(Parser, Debug, Clone, PartialEq, Eq)]
    #[clap(
        author,
        name = "kafka-discovery",
        bin_name = "kafka-discovery",
        about,
        long_about = None,
        disable_help_flag = true
    )]
    /// prints a bootstrap string for the live Kafka brokers registered in ZooKeeper.
    /// parses from cli & environment var, a `.env` in the working dir is loaded as well
    pub struct Config {
        /// ZooKeeper host
        #[clap(short = 'h', long, env = "ZOOKEEPER_HOST", value_parser)]
        pub host: Option<String>,
        /// ZooKeeper port
        #[clap(short, long, env = "ZOOKEEPER_PORT", value_parser)]
        pub port: Option<String>,
        /// registry path brokers register under
        #[clap(long, env, value_parser, default_value = DEFAULT_REGISTRY_PATH)]
        pub registry_path: String,
        /// max number of brokers in the connection string
        #[clap(long, env, value_parser, default_value_t = DEFAULT_BROKER_LIMIT)]
        pub max_brokers: usize,
        /// bound on a single connect attempt, in seconds
        #[clap(long, env, value_parser, default_value_t = DEFAULT_CONNECT_TIMEOUT)]
        pub connect_timeout: u64,
        /// connect retries after the first failed attempt
        #[clap(long, env, value_parser, default_value_t = DEFAULT_CONNECT_RETRY_MAX)]
        pub connect_retry_max: u32,
        /// set the log level. All valid RUST_LOG arguments are accepted
        #[clap(long, env, value_parser, default_value = DEFAULT_DISCOVERY_LOG)]
        pub discovery_log: String,
        /// log format: standard, json or pretty
        #[clap(long, env, value_parser, default_value = DEFAULT_LOG_FORMAT)]
        pub log_format: String,
        /// Print help
        #[clap(long, action = clap::ArgAction::Help)]
        pub help: Option<bool>,
    }

    impl Config {
        /// both host and port were given
        pub fn has_target(&self) -> bool {
            self.host.is_some() && self.port.is_some()
        }

        /// Create new connect timeout as `Duration`
        pub fn connect_timeout(&self) -> Duration {
            Duration::from_secs(self.connect_timeout)
        }

        /// validated, immutable discovery settings
        pub fn discovery_config(&self) -> DiscoveryResult<DiscoveryConfig> {
            DiscoveryConfig::new(self.host.as_deref(), self.port.as_deref())?
                .with_registry_path(self.registry_path.clone())?
                .with_limit(self.max_brokers)
        }

        /// ZooKeeper connector using the configured timeout & retries
        pub fn connector(&self) -> ZkConnector {
            ZkConnector::new(self.connect_timeout(), self.connect_retry_max)
        }

        /// print usage to stdout
        pub fn print_usage() -> std::io::Result<()> {
            Self::command().print_help()
        }
    }

}

pub mod trace {
    //! tracing configuration
    use anyhow::Result;
    use tracing_subscriber::{
        filter::EnvFilter,
        fmt::{
            self,
            format::{Format, PrettyFields},
        },
        prelude::__tracing_subscriber_SubscriberExt,
        util::SubscriberInitExt,
    };

    /// Logging setup. Everything goes to stderr, stdout carries only the
    /// connection string.
    #[derive(Debug)]
    pub struct Config {
        /// formatting to apply to logs
        pub log_frmt: String,
    }

    impl Config {
        /// Install the global subscriber
        pub fn parse(discovery_log: &str, log_frmt: &str) -> Result<Self> {
            let filter = EnvFilter::try_new(discovery_log)
                .or_else(|_| EnvFilter::try_new("info"))?
                .add_directive("zookeeper_client=warn".parse()?);

            match log_frmt {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json().with_writer(std::io::stderr))
                        .init();
                }
                "pretty" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(
                            fmt::layer()
                                .event_format(
                                    Format::default().pretty().with_source_location(false),
                                )
                                .fmt_fields(PrettyFields::new())
                                .with_writer(std::io::stderr),
                        )
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().with_writer(std::io::stderr))
                        .init();
                }
            }

            Ok(Self {
                log_frmt: log_frmt.to_owned(),
            })
        }
    }
}
