#![allow(clippy::cognitive_complexity)]
use anyhow::{Context, Result, anyhow};

use discovery_core::{
    Discoverer,
    config::{
        cli::{self, Parser},
        trace,
    },
    tokio::runtime::Builder,
    tracing::*,
};

fn main() -> Result<()> {
    // .env first so its values reach clap's env fallbacks
    let dotenv = dotenv::dotenv();
    // parses from cli or environment var
    let config = cli::Config::parse();
    let trace_config = trace::Config::parse(&config.discovery_log, &config.log_format)?;
    debug!(?config, ?trace_config);
    if let Err(err) = dotenv {
        debug!(?err, ".env file not loaded");
    }

    if !config.has_target() {
        cli::Config::print_usage()?;
        return Ok(());
    }

    let rt = Builder::new_current_thread().enable_all().build()?;
    match rt.block_on(discover(config)) {
        Ok(connection_string) => {
            println!("{connection_string}");
            Ok(())
        }
        Err(err) => {
            error!(?err, "kafka-discovery exited with error");
            Err(err)
        }
    }
}

async fn discover(config: cli::Config) -> Result<String> {
    let discovery = config
        .discovery_config()
        .context("invalid discovery settings")?;
    let path = discovery.registry_path().to_owned();
    info!(registry = discovery.target(), %path, "discovering brokers");

    let mut discoverer = Discoverer::connect(discovery, config.connector())
        .await
        .context("broker discovery failed")?;
    let connection_string = discoverer.connection_string();
    discoverer.close().await;

    connection_string.ok_or_else(|| anyhow!("no brokers registered under {path}"))
}
