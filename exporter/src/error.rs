//! Error types shared across the exporter.
//!
//! None of these are fatal once the exporter is running: decode and
//! source failures degrade a single metric update, configuration errors
//! only surface during startup.

use thiserror::Error;

/// A single event or storage value could not be interpreted.
#[derive(Debug, Error)]
#[error("failed to decode {what}: {source}")]
pub struct DecodeError {
    /// Human-readable name of the value that failed to decode.
    pub what: &'static str,
    #[source]
    pub source: codec::Error,
}

impl DecodeError {
    pub fn new(what: &'static str, source: codec::Error) -> Self {
        Self { what, source }
    }
}

/// Errors raised by a chain state implementation or one of its feeds.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport or RPC-level failure talking to the node.
    #[error("rpc error: {0}")]
    Rpc(String),
    /// The node returned a value with an unexpected shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// A subscription ended without reporting an error.
    #[error("{0} subscription closed")]
    Closed(&'static str),
    /// The node reported chain parameters the exporter cannot work with.
    #[error("unsupported chain parameter: {0}")]
    Unsupported(String),
}

/// Invalid process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failure while constructing the metrics registry.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}
