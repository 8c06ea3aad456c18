use axum::{extract::State, http::header};

use crate::state::SharedState;

/// `GET /metrics`
///
/// Prometheus text exposition of every exporter gauge.
pub async fn metrics(
    State(state): State<SharedState>,
) -> ([(header::HeaderName, String); 1], String) {
    (
        [(header::CONTENT_TYPE, state.metrics.content_type())],
        state.metrics.gather_text(),
    )
}
