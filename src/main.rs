//! Skycast - current weather for a city, served as a web page
//!
//! Starts the HTTP server with an in-memory response cache and clears the
//! cache once the server has shut down.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use skycast::cache::ExpiringCache;
use skycast::cli::{Cli, StartupConfig};
use skycast::data::WeatherClient;
use skycast::logging;
use skycast::service::WeatherService;
use skycast::web::{create_router, AppState};

/// Resolves when the process receives Ctrl-C
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = StartupConfig::from_cli(&cli)?;

    logging::init_logging(&config.logging);

    if config.uses_dev_api_key() {
        warn!("No OPENWEATHER_API_KEY configured; using the development placeholder key");
    }

    let http = reqwest::Client::builder().timeout(config.timeout).build()?;
    let client = WeatherClient::with_client(http, config.api_key.clone())
        .with_base_url(config.base_url.clone())
        .with_units(config.units);

    let cache = Arc::new(ExpiringCache::new(config.freshness));
    let service = WeatherService::new(client, Arc::clone(&cache));
    let app = create_router(AppState::new(service));

    let listener = TcpListener::bind(config.addr).await?;
    info!(
        "Starting server on {} (freshness window {} min)",
        config.addr,
        config.freshness.num_minutes()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let dropped = cache.clear();
    info!(dropped, "Cache cleared, server stopped");

    Ok(())
}
