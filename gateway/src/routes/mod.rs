//! HTTP route handlers.

pub mod health;
pub mod index;
pub mod metrics;

use axum::{Router, routing::any};

use crate::state::SharedState;

/// Builds the HTTP router. Paths are matched regardless of method.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/metrics", any(metrics::metrics))
        .route("/healthz", any(health::healthz))
        .fallback(index::index)
        .with_state(state)
}

#[cfg(test)]
pub(crate) fn test_state() -> crate::state::SharedState {
    use std::sync::Arc;

    Arc::new(crate::state::AppState {
        metrics: Arc::new(
            exporter::MetricsRegistry::new("ple", "westend").expect("create registry"),
        ),
        health: exporter::HealthState::new(),
    })
}
