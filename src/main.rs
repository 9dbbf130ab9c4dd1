//! Redirect service.
//!
//! Maps short request paths to destination URLs and answers with
//! `302 Found`. Mappings can be added at runtime with `POST /add` and
//! listed with `GET /mappings`.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ listener ──▶ axum router ──┬─▶ /add       ──▶ PathStore::add
//!                                                ├─▶ /mappings  ──▶ PathStore::snapshot
//!                                                └─▶ /{path}    ──▶ PathStore::lookup
//!                                                                       │
//!     ◀──────────────────────── 302 Location / 404 ◀────────────────────┘
//!
//!     urls.json ──▶ bootstrap (startup) / watcher (hot reload) ──▶ PathStore
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use redirect_service::config::{load_config, RedirectConfig};
use redirect_service::lifecycle::{self, signals, Shutdown};
use redirect_service::observability::{logging, metrics};
use redirect_service::HttpServer;

#[derive(Parser)]
#[command(name = "redirect-service")]
#[command(about = "Path-based HTTP redirect service", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the JSON mapping file.
    #[arg(short, long)]
    mappings: Option<PathBuf>,

    /// Re-read the mapping file when it changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("loading config {}", path.display()))?,
        None => RedirectConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(mappings) = args.mappings {
        config.mappings.file = Some(mappings);
    }
    if args.watch {
        config.mappings.watch = true;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("redirect-service v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mappings_file = ?config.mappings.file,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .context("parsing metrics address")?;
        metrics::init_metrics(addr);
    }

    let startup = lifecycle::initialize(&config);
    tracing::info!(source = ?startup.source, count = startup.store.len(), "Store ready");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());
    let server_shutdown = shutdown.subscribe();

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, startup.store).with_bootstrap_source(startup.source);

    match tls {
        Some(tls) => {
            let addr: SocketAddr = bind_address.parse().context("parsing bind address")?;
            let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .with_context(|| format!("loading TLS material {} / {}", tls.cert_path, tls.key_path))?;
            server.run_tls(addr, rustls, startup.updates, server_shutdown).await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address)
                .await
                .with_context(|| format!("binding {}", bind_address))?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            server.run(listener, startup.updates, server_shutdown).await?;
        }
    }

    // Keep the watcher alive for the whole serve loop.
    drop(startup.watcher);
    tracing::info!("Shutdown complete");
    Ok(())
}
