//! Secure Link Reverse Proxy
//!
//! Guards a set of path prefixes with keyed link hashes and forwards admitted
//! requests to a single upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ──▶ secure link ──┬──▶ 403 Forbidden
//!                                     middleware   ├──▶ 410 Gone
//!                                                  └──▶ proxy handler ──▶ Upstream
//!
//!     config file ──▶ loader ──▶ validation ──▶ SecureLink (ArcSwap)
//!          └── watcher (reload) ─────────────────────▲
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use securelink_proxy::config::{load_config, ConfigWatcher};
use securelink_proxy::http::HttpServer;
use securelink_proxy::lifecycle::{trigger_on_signal, Shutdown};
use securelink_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "securelink-proxy")]
#[command(about = "Reverse proxy guarding paths with signed links", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "securelink.toml")]
    config: PathBuf,

    /// Reload secure link settings when the config file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Fail fast on bad config, before anything is bound
    let config = load_config(&args.config)?;

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "securelink-proxy starting"
    );

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        request_timeout_secs = config.timeouts.request_secs,
        query = config.securelink.query,
        check_expire = config.securelink.check_expire,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // Reloads only arrive with --watch
    let (watcher, config_updates) = ConfigWatcher::new(&args.config);
    let _watch_guard = if args.watch { Some(watcher.run()?) } else { None };

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    trigger_on_signal(&shutdown);

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
