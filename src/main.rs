//! SWAPI forwarding gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                  GATEWAY                      │
//!   Browser request      │  ┌──────┐   ┌──────────┐   ┌──────────────┐  │
//!   ─────────────────────┼─▶│ cors │──▶│ dispatch │──▶│    proxy     │──┼──▶ Upstream API
//!                        │  └──────┘   └────┬─────┘   │  (GET only)  │  │
//!                        │                  │         └──────────────┘  │
//!                        │                  ▼                           │
//!                        │           ┌────────────┐                     │
//!                        │           │  logstore  │──▶ logs/<year>/...  │
//!                        │           └────────────┘                     │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use swapi_gateway::lifecycle::{load_startup_config, Shutdown};
use swapi_gateway::observability::{logging, metrics};
use swapi_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "swapi-gateway")]
#[command(about = "Forwards browser requests to the SWAPI upstream and stores client error reports", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_startup_config(args.config.as_deref(), args.bind.as_deref())?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("swapi-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        connect_timeout_secs = config.upstream.connect_timeout_secs,
        accept_invalid_certs = config.upstream.accept_invalid_certs,
        log_root = %config.logs.root_dir,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
