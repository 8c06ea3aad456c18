//! Exporter library crate.
//!
//! This crate holds everything the relay-chain / parachain exporter does
//! besides talking to the node and serving HTTP:
//!
//! - strongly-typed chain values and event classification (`types`),
//! - the node abstraction the rest of the crate is written against
//!   (`source`),
//! - the metric derivation engine: slash aggregation, era-change
//!   detection, lease-period recomputation and parachain head extraction
//!   (`engine`),
//! - Prometheus gauges (`metrics`),
//! - the connection health flag (`health`),
//! - and process configuration (`config`).
//!
//! The gateway binary plugs a live node client into [`Exporter`] and
//! serves [`MetricsRegistry`] and [`HealthState`] over HTTP.

pub mod config;
pub mod engine;
pub mod error;
pub mod health;
pub mod metrics;
pub mod source;
pub mod types;

pub use config::ExporterConfig;
pub use engine::{BlockEvents, Exporter};
pub use error::{ConfigError, DecodeError, MetricsError, SourceError};
pub use health::HealthState;
pub use metrics::{ExporterMetrics, MetricsRegistry};
pub use source::{ChainFeeds, ChainState, EventBatch, Feed};

// Re-export domain types at the crate root for convenience.
pub use types::*;
