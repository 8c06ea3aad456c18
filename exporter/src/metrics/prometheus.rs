//! Prometheus-backed gauge set.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and the strongly-typed exporter gauges. Rendering the text
//! exposition format is left to [`MetricsRegistry::gather_text`]; serving
//! it over HTTP is the gateway's job.

use std::collections::HashMap;

use prometheus::{self, Encoder, Gauge, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::error::MetricsError;
use crate::types::{BlockNumber, ParaId};

/// Label carrying the parachain id on per-parachain series.
pub const PARA_ID_LABEL: &str = "para_id";

/// Constant label carrying the chain name on every series.
pub const CHAIN_LABEL: &str = "chain";

/// Relay-chain and parachain gauges derived from the event stream.
///
/// Every gauge is internally atomic, so concurrent tasks can update
/// distinct series (or the same one, last write wins) without locking.
#[derive(Clone)]
pub struct ExporterMetrics {
    /// Number of the latest best relay-chain block.
    pub relay_best_block: IntGauge,
    /// Number of the latest finalized relay-chain block.
    pub relay_finalized_head: IntGauge,
    /// Slashed amount in whole tokens since the active era started.
    pub active_era_slashes_total: Gauge,
    /// Current lease period index of the relay chain.
    pub current_lease_period_index: IntGauge,
    /// Best block of each parachain, by `para_id`.
    pub para_best_block: IntGaugeVec,
    /// 1 if a parachain's lease runs out after the current period.
    pub para_final_lease_period: IntGaugeVec,
}

impl ExporterMetrics {
    /// Registers the exporter gauges into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let relay_best_block = IntGauge::with_opts(Opts::new(
            "relaychain_best_block_number",
            "best block of the relay chain",
        ))?;
        registry.register(Box::new(relay_best_block.clone()))?;

        let relay_finalized_head = IntGauge::with_opts(Opts::new(
            "relaychain_finalized_head_number",
            "finalized head of the relay chain",
        ))?;
        registry.register(Box::new(relay_finalized_head.clone()))?;

        let active_era_slashes_total = Gauge::with_opts(Opts::new(
            "relaychain_active_era_slashes_total",
            "total amount of slashes in the active era",
        ))?;
        registry.register(Box::new(active_era_slashes_total.clone()))?;

        let current_lease_period_index = IntGauge::with_opts(Opts::new(
            "relaychain_current_lease_period_index",
            "the current lease period index",
        ))?;
        registry.register(Box::new(current_lease_period_index.clone()))?;

        let para_best_block = IntGaugeVec::new(
            Opts::new("parachain_best_block_number", "best block of a parachain"),
            &[PARA_ID_LABEL],
        )?;
        registry.register(Box::new(para_best_block.clone()))?;

        let para_final_lease_period = IntGaugeVec::new(
            Opts::new(
                "parachain_final_lease_period",
                "set to 1 if a parachains lease will run out after the current lease period",
            ),
            &[PARA_ID_LABEL],
        )?;
        registry.register(Box::new(para_final_lease_period.clone()))?;

        Ok(Self {
            relay_best_block,
            relay_finalized_head,
            active_era_slashes_total,
            current_lease_period_index,
            para_best_block,
            para_final_lease_period,
        })
    }

    /// Gauge series for one parachain's best block.
    pub fn para_best_block(&self, para_id: ParaId) -> IntGauge {
        self.para_best_block
            .with_label_values(&[para_id.label().as_str()])
    }

    /// Gauge series for one parachain's final-lease-period flag.
    pub fn para_final_lease_period(&self, para_id: ParaId) -> IntGauge {
        self.para_final_lease_period
            .with_label_values(&[para_id.label().as_str()])
    }

    pub fn set_relay_best_block(&self, number: BlockNumber) {
        self.relay_best_block.set(i64::from(number));
    }

    pub fn set_relay_finalized_head(&self, number: BlockNumber) {
        self.relay_finalized_head.set(i64::from(number));
    }
}

/// Wrapper around a Prometheus registry and the exporter gauges.
///
/// This is the main handle passed around in the process. It can be
/// wrapped in an [`std::sync::Arc`] and shared across tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub exporter: ExporterMetrics,
}

impl MetricsRegistry {
    /// Creates a registry whose metric names start with `prefix` (none if
    /// empty) and whose series all carry `chain="<chain>"`.
    pub fn new(prefix: &str, chain: &str) -> Result<Self, MetricsError> {
        let prefix = (!prefix.is_empty()).then(|| prefix.to_string());
        let labels = HashMap::from([(CHAIN_LABEL.to_string(), chain.to_lowercase())]);

        let registry = Registry::new_custom(prefix, Some(labels))?;
        let exporter = ExporterMetrics::register(&registry)?;
        Ok(Self { registry, exporter })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    /// Content type of [`gather_text`](Self::gather_text) output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exporter_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = ExporterMetrics::register(&registry).expect("register metrics");

        metrics.set_relay_best_block(10);
        metrics.set_relay_finalized_head(8);
        metrics.active_era_slashes_total.add(3.0);
        metrics.para_best_block(ParaId(1000)).set(42);

        assert_eq!(metrics.relay_best_block.get(), 10);
        assert_eq!(metrics.para_best_block(ParaId(1000)).get(), 42);
        assert!(!registry.gather().is_empty());
    }

    #[test]
    fn gather_text_applies_prefix_and_chain_label() {
        let registry = MetricsRegistry::new("ple", "Polkadot").expect("create registry");
        registry.exporter.set_relay_best_block(7);
        registry.exporter.para_final_lease_period(ParaId(2000)).set(1);

        let text = registry.gather_text();
        assert!(text.contains("ple_relaychain_best_block_number{chain=\"polkadot\"} 7"));
        assert!(text.contains(
            "ple_parachain_final_lease_period{chain=\"polkadot\",para_id=\"2000\"} 1"
        ));
    }

    #[test]
    fn empty_prefix_means_no_prefix() {
        let registry = MetricsRegistry::new("", "kusama").expect("create registry");
        registry.exporter.set_relay_finalized_head(3);

        let text = registry.gather_text();
        assert!(text.contains("\nrelaychain_finalized_head_number{chain=\"kusama\"} 3"));
    }

    #[test]
    fn para_series_are_keyed_by_id() {
        let registry = MetricsRegistry::new("ple", "rococo").expect("create registry");
        let metrics = &registry.exporter;

        metrics.para_best_block(ParaId(1)).set(5);
        metrics.para_best_block(ParaId(1)).set(6);
        metrics.para_best_block(ParaId(2)).set(9);

        let text = registry.gather_text();
        assert_eq!(text.matches("para_id=\"1\"").count(), 1);
        assert!(text.contains("para_id=\"1\"} 6"));
        assert!(text.contains("para_id=\"2\"} 9"));
    }
}
