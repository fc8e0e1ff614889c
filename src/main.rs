// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use usage_stats::application::stats_service::StatsService;
use usage_stats::infrastructure::config::load_stats_config;
use usage_stats::infrastructure::http_stats_provider::HttpStatsProvider;
use usage_stats::presentation::app_state::AppState;
use usage_stats::presentation::handlers::{get_stats, health_check, stream_stats};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_stats_config()?;

    // Provider (infrastructure layer)
    let provider = Arc::new(HttpStatsProvider::new(
        config.upstream.url.clone(),
        Duration::from_secs(config.upstream.timeout_secs),
    )?);

    // Service (application layer)
    let stats_service = StatsService::new(provider, config.panels.clone());

    let state = Arc::new(AppState { stats_service });

    // Router (presentation layer); bodies are compressed by the handlers
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/stats", get(get_stats))
        .route("/stats/stream", get(stream_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!(
        "Starting usage-stats service on {} ({} panels, upstream {})",
        addr,
        config.panels.len(),
        config.upstream.url
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
