// gateway/src/main.rs

//! Exporter binary.
//!
//! Connects to a relay-chain node, derives the exporter gauges from its
//! live event stream and serves them over HTTP:
//!
//! - `/metrics`
//! - `/healthz`
//! - anything else: a small index page.
//!
//! Routes match on path only, whatever the method.

mod follower;
mod node;
mod routes;
mod state;

use std::sync::Arc;

use tokio::signal;

use exporter::{ExporterConfig, HealthState, MetricsRegistry};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "exporter=info,parachain_exporter=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cfg = ExporterConfig::from_env().map_err(|e| format!("invalid configuration: {e}"))?;

    // ---------------------------
    // First node connection
    // ---------------------------

    let chain = follower::connect_with_retry(&cfg).await;
    let chain_name = chain
        .chain_name()
        .await
        .map_err(|e| format!("failed to read chain name: {e}"))?;
    tracing::info!(chain = %chain_name, url = %cfg.ws_provider, "node ready");

    // ---------------------------
    // Metrics + health
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new(&cfg.metrics_prefix, &chain_name)
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );
    let health = HealthState::new();

    tokio::spawn(follower::follow_chain(
        cfg.clone(),
        chain,
        metrics.exporter.clone(),
        health.clone(),
    ));

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState { metrics, health });

    let app = routes::router(app_state);

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", cfg.listen_addr))?;

    tracing::info!("server listening on http://{}", cfg.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("HTTP server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
