//! EchoGrid field client entry point.
//!
//! Wires configuration, logging, and a session context together. The
//! radio transport and location provider are attached by the platform
//! shell; standalone invocation is useful for config validation and
//! version handshakes.

use std::path::PathBuf;

use echogrid_core::{logging, Config};
use echogrid_uplink::{HttpCollector, SessionContext};
use serde::Serialize;

const CLIENT_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct ClientVersionHandshake {
    version: &'static str,
    protocol_version: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = ClientVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            protocol_version: CLIENT_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    logging::init();

    let config = match parse_config_path(&args)? {
        Some(path) => Config::from_file(path)?,
        None => Config::default_config(),
    };

    tracing::info!(
        channel = %config.channel.name,
        endpoint = %config.collector.endpoint,
        "echogrid client starting"
    );

    let collector = HttpCollector::new(&config.collector);
    let session = SessionContext::new(&config, collector);
    let status = session.status();

    tracing::info!(
        crypto_available = status.crypto_available,
        queue = %status.queue_status,
        "session context ready; waiting for transport attachment"
    );

    // The platform shell drives frames and ticks; standalone we idle.
    loop {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    }
}

fn parse_config_path(args: &[String]) -> anyhow::Result<Option<PathBuf>> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            return match args_iter.next() {
                Some(path) => Ok(Some(PathBuf::from(path))),
                None => Err(anyhow::anyhow!("--config was provided without a path")),
            };
        }
    }
    Ok(None)
}
