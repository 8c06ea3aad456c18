//! Metrics for the exporter.
//!
//! This module defines the Prometheus gauges the exporter publishes. The
//! metric derivation engine writes them; the gateway renders them on
//! `/metrics`.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use exporter::metrics::MetricsRegistry;
//!
//! let registry = Arc::new(MetricsRegistry::new("ple", "polkadot")?);
//!
//! // Elsewhere in the code:
//! registry.exporter.set_relay_best_block(number);
//! let body = registry.gather_text();
//! ```

pub mod prometheus;

pub use self::prometheus::{CHAIN_LABEL, ExporterMetrics, MetricsRegistry, PARA_ID_LABEL};
