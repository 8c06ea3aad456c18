//! Top-level configuration for the exporter process.
//!
//! Everything is read from environment variables:
//!
//! - `WS_PROVIDER`: node WebSocket endpoint,
//! - `PORT`: HTTP port for `/metrics` and `/healthz`,
//! - `PARACHAIN_IDS`: JSON array of parachain ids to watch,
//! - `METRICS_PREFIX`: prefix for every metric name,
//! - `RECONNECT_DELAY_SECS`: pause before reconnecting to the node.
//!
//! [`ExporterConfig::from_lookup`] takes the variable source as a closure
//! so the parsing can be exercised without touching the process
//! environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::ParaId;

pub const DEFAULT_WS_PROVIDER: &str = "ws://localhost:9944";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_METRICS_PREFIX: &str = "ple";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Configuration for the exporter process.
#[derive(Clone, Debug)]
pub struct ExporterConfig {
    /// WebSocket URL of the relay-chain node.
    pub ws_provider: String,
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Parachains whose lease status is tracked.
    pub parachain_ids: Vec<ParaId>,
    /// Prefix prepended to every metric name (empty for none).
    pub metrics_prefix: String,
    /// Delay between a lost connection and the next connection attempt.
    pub reconnect_delay: Duration,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            ws_provider: DEFAULT_WS_PROVIDER.to_string(),
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            parachain_ids: Vec::new(),
            metrics_prefix: DEFAULT_METRICS_PREFIX.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ExporterConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Unset
    /// variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("WS_PROVIDER") {
            cfg.ws_provider = url;
        }

        if let Some(port) = lookup("PORT") {
            let port: u16 = port.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: format!("{e}"),
            })?;
            cfg.listen_addr.set_port(port);
        }

        if let Some(ids) = lookup("PARACHAIN_IDS") {
            cfg.parachain_ids =
                serde_json::from_str(&ids).map_err(|e| ConfigError::Invalid {
                    key: "PARACHAIN_IDS",
                    reason: format!("{e}"),
                })?;
        }

        if let Some(prefix) = lookup("METRICS_PREFIX") {
            cfg.metrics_prefix = prefix;
        }

        if let Some(secs) = lookup("RECONNECT_DELAY_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "RECONNECT_DELAY_SECS",
                reason: format!("{e}"),
            })?;
            cfg.reconnect_delay = Duration::from_secs(secs);
        }

        Ok(cfg)
    }
}
