//! Metric derivation engine.
//!
//! The engine turns one connection's feeds into gauge updates:
//!
//! - best and finalized heads are written straight through,
//! - every event batch is split by kind and fanned out to slash
//!   aggregation ([`slashes`]), era-change detection ([`era`], which may
//!   trigger a lease recomputation in [`leases`]) and parachain head
//!   extraction ([`heads`]).
//!
//! The engine owns no mutable state of its own. Everything it derives is
//! written to [`ExporterMetrics`], whose series are independent atomics.

pub mod era;
pub mod heads;
pub mod leases;
pub mod slashes;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use futures::StreamExt;

use crate::error::SourceError;
use crate::health::HealthState;
use crate::metrics::ExporterMetrics;
use crate::source::{ChainFeeds, ChainState, EventBatch};
use crate::types::{
    Balance, CandidateIncluded, ChainEvent, Decoded, ParaId, SessionIndex, TokenScale,
};

/// Per-connection metric derivation engine.
///
/// Generic over the [`ChainState`] implementation so it can be driven by
/// the live node client or an in-memory chain in tests.
pub struct Exporter<C> {
    chain: C,
    metrics: ExporterMetrics,
    watched: Vec<ParaId>,
    token_scale: TokenScale,
}

/// One block's events, split into the subsequences each derivation
/// consumes. Within a kind, on-chain order is preserved.
#[derive(Debug, Default)]
pub struct BlockEvents<'a> {
    pub slashes: Vec<&'a Decoded<Balance>>,
    pub session_changes: Vec<&'a Decoded<SessionIndex>>,
    pub inclusions: Vec<&'a Decoded<CandidateIncluded>>,
}

impl<'a> BlockEvents<'a> {
    pub fn split(events: &'a [ChainEvent]) -> Self {
        let mut block = Self::default();
        for event in events {
            match event {
                ChainEvent::Slashed(amount) => block.slashes.push(amount),
                ChainEvent::NewSession(index) => block.session_changes.push(index),
                ChainEvent::CandidateIncluded(candidate) => block.inclusions.push(candidate),
                ChainEvent::Other => {}
            }
        }
        block
    }
}

impl<C: ChainState> Exporter<C> {
    pub fn new(
        chain: C,
        metrics: ExporterMetrics,
        watched: Vec<ParaId>,
        token_scale: TokenScale,
    ) -> Self {
        Self {
            chain,
            metrics,
            watched,
            token_scale,
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    /// Handles one block's worth of events.
    ///
    /// Slashes are aggregated first; era-change detection and parachain
    /// head extraction then run concurrently, reading storage at the block
    /// the events came from.
    pub async fn handle_events(&self, batch: &EventBatch) {
        let events = BlockEvents::split(&batch.events);

        self.update_slashes(&events.slashes);

        tokio::join!(
            self.check_new_era(&batch.block, &events.session_changes),
            self.update_parachain_heads(&batch.block, &events.inclusions),
        );
    }

    /// Runs one established connection: the health flag is up for as long
    /// as [`Exporter::run`] is, and down again once it returns.
    pub async fn serve(self: Arc<Self>, feeds: ChainFeeds, health: &HealthState) -> SourceError {
        health.set_connected();
        let err = self.run(feeds).await;
        health.set_failed();
        err
    }

    /// Runs the engine against one connection's feeds until one of them
    /// fails or closes, and returns that error.
    ///
    /// The era slash total starts from zero and lease status is computed
    /// once up front, alongside the feeds.
    pub async fn run(self: Arc<Self>, feeds: ChainFeeds) -> SourceError {
        self.metrics.active_era_slashes_total.set(0.0);

        let (err, ()) = tokio::join!(
            Arc::clone(&self).drive(feeds),
            self.update_parachain_leases(),
        );
        err
    }

    async fn drive(self: Arc<Self>, feeds: ChainFeeds) -> SourceError {
        let ChainFeeds {
            mut best_heads,
            mut finalized_heads,
            mut events,
        } = feeds;

        loop {
            tokio::select! {
                next = best_heads.next() => match next {
                    Some(Ok(number)) => {
                        tracing::debug!(number, "new best head");
                        self.metrics.set_relay_best_block(number);
                    }
                    Some(Err(e)) => return e,
                    None => return SourceError::Closed("best heads"),
                },
                next = finalized_heads.next() => match next {
                    Some(Ok(number)) => {
                        tracing::debug!(number, "new finalized head");
                        self.metrics.set_relay_finalized_head(number);
                    }
                    Some(Err(e)) => return e,
                    None => return SourceError::Closed("finalized heads"),
                },
                next = events.next() => match next {
                    // Batches are handled on their own task so a slow
                    // storage read never holds up the next block.
                    Some(Ok(batch)) => {
                        let this = Arc::clone(&self);
                        tokio::spawn(async move {
                            this.handle_events(&batch).await;
                        });
                    }
                    Some(Err(e)) => return e,
                    None => return SourceError::Closed("events"),
                },
            }
        }
    }
}
