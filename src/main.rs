//! chix: serve static directories with structured request logs.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net listener ──▶ request id ──▶ request logger ──▶ router
//!                                                         │                 │
//!                                                         │        ┌────────┴────────┐
//!                                                         │        ▼                 ▼
//!                                                         │   static mount       not found
//!                                                         │   (ServeDir)          (404 page)
//!                                                         ▼
//!                                        "request started" / "request complete"
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use chix::config::{load_config, validate_config, ConfigError, MountConfig, ServerConfig};
use chix::http::HttpServer;
use chix::lifecycle::{shutdown_signal, Shutdown};
use chix::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "chix")]
#[command(about = "Serve static directories with structured request logging", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Mount a directory as PATTERN=DIR (repeatable).
    #[arg(short, long = "mount", value_name = "PATTERN=DIR")]
    mounts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    for mount in &cli.mounts {
        let (pattern, root) = mount
            .split_once('=')
            .ok_or_else(|| format!("mount {mount:?} is not PATTERN=DIR"))?;
        config.mounts.push(MountConfig {
            pattern: pattern.to_string(),
            root: root.into(),
        });
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mounts = config.mounts.len(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
