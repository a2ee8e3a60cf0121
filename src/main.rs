//! kati: HTTP Reverse Proxy Server
//!
//! Routes HTTP traffic to backend hosts by matching request paths against
//! an ordered list of regular expressions.

use clap::Parser;
use kati::args::Args;
use kati::ProxyServer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kati=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting kati v{}", env!("CARGO_PKG_VERSION"));

    // Resolve configuration from flags and the optional config file
    let config = Args::parse().into_config()?;

    // Create the proxy server; mapping errors are fatal before any traffic
    // is accepted
    let server = ProxyServer::new(config)?;

    // Run the proxy server; a bind or serve failure exits nonzero
    server.run().await?;

    Ok(())
}
