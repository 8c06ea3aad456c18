//! Shared application state for the HTTP handlers.

use std::sync::Arc;

use exporter::{HealthState, MetricsRegistry};

/// State read by the HTTP handlers.
///
/// The connection follower writes the gauges and the health flag; the
/// handlers only ever read them.
pub struct AppState {
    /// Registry rendered on `/metrics`.
    pub metrics: Arc<MetricsRegistry>,
    /// Node connection health reported on `/healthz`.
    pub health: HealthState,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
