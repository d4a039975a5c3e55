//! Journey server: staff appointment wizards backed by a shared journey store.
//!
//! Main entry point that loads configuration, builds the store and starts the server.

mod auth;
mod rest;
mod server;
mod wizard;

use clap::Parser;
use journey_core::config::{AppConfig, StoreBackend};
use journey_store::{CacheStore, JourneyStore, LocalBackend, RedisBackend};
use server::ApiServer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "journey-server")]
#[command(about = "Staff appointment wizards with durable per-journey state")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "JOURNEY_SESSION__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Hours journey data is kept after its last write (overrides config)
    #[arg(long, env = "JOURNEY_SESSION__JOURNEY__JOURNEY_DATA_TOKEN_DURATION_HOURS")]
    journey_ttl_hours: Option<u64>,

    /// Keep journey data in process instead of Redis (single instance only)
    #[arg(long, default_value_t = false)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "journey_server=info,journey_session=info,journey_store=info,tower_http=info".into()
            }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Journey server starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(hours) = cli.journey_ttl_hours {
        config.journey.journey_data_token_duration_hours = hours;
    }
    if cli.memory_store {
        config.store_backend = StoreBackend::Memory;
    }

    config.validate()?;

    info!(
        http_port = config.api.http_port,
        store_backend = ?config.store_backend,
        journey_ttl_secs = config.journey.ttl_secs(),
        write_timeout_ms = config.journey.write_timeout_ms,
        "Configuration loaded"
    );

    let store: Arc<dyn JourneyStore> = match config.store_backend {
        StoreBackend::Redis => Arc::new(CacheStore::new(RedisBackend::new(&config.redis)?)),
        StoreBackend::Memory => {
            let local = LocalBackend::new();
            let for_maintenance = local.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                loop {
                    interval.tick().await;
                    let evicted = for_maintenance.evict_expired();
                    if evicted > 0 {
                        tracing::debug!(evicted = evicted, "Local journey store eviction complete");
                    }
                }
            });
            Arc::new(CacheStore::new(local))
        }
    };

    let api_server = ApiServer::new(config, store);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics() {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("Journey server is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
