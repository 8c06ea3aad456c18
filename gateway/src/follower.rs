//! Node connection lifecycle.
//!
//! Keeps one exporter running against the node for the life of the
//! process: connect, derive metrics until a feed fails, wait, reconnect.
//! The health flag follows [`Exporter::serve`]. Gauges persist across
//! reconnections; the token scale and lease period are re-read each time.

use std::sync::Arc;

use exporter::{
    Exporter, ExporterConfig, ExporterMetrics, HealthState, SourceError, TokenScale,
};

use crate::node::SubxtChain;

/// Connects to the node, retrying every `reconnect_delay` until it works.
pub async fn connect_with_retry(cfg: &ExporterConfig) -> SubxtChain {
    loop {
        match SubxtChain::connect(&cfg.ws_provider).await {
            Ok(chain) => return chain,
            Err(e) => {
                tracing::error!(url = %cfg.ws_provider, error = %e, "failed to connect to node");
                tokio::time::sleep(cfg.reconnect_delay).await;
            }
        }
    }
}

/// Runs the exporter against `chain`, reconnecting forever.
pub async fn follow_chain(
    cfg: ExporterConfig,
    mut chain: SubxtChain,
    metrics: ExporterMetrics,
    health: HealthState,
) {
    loop {
        let err = run_connection(&cfg, chain, &metrics, &health).await;
        tracing::error!(error = %err, "lost node connection");

        tokio::time::sleep(cfg.reconnect_delay).await;
        chain = connect_with_retry(&cfg).await;
    }
}

async fn run_connection(
    cfg: &ExporterConfig,
    chain: SubxtChain,
    metrics: &ExporterMetrics,
    health: &HealthState,
) -> SourceError {
    let decimals = match chain.token_decimals().await {
        Ok(decimals) => decimals,
        Err(e) => return e,
    };
    let token_scale = match TokenScale::from_decimals(decimals) {
        Ok(scale) => scale,
        Err(e) => return e,
    };
    let feeds = match chain.feeds().await {
        Ok(feeds) => feeds,
        Err(e) => return e,
    };

    tracing::info!(
        url = %cfg.ws_provider,
        decimals,
        watched = ?cfg.parachain_ids,
        "connected to node"
    );

    let exporter = Arc::new(Exporter::new(
        chain,
        metrics.clone(),
        cfg.parachain_ids.clone(),
        token_scale,
    ));
    exporter.serve(feeds, health).await
}
