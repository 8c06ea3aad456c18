//! Abstraction over the node connection.
//!
//! The exporter never talks to the node directly. It reads point-in-time
//! storage through [`ChainState`] and consumes the three push feeds bundled
//! in [`ChainFeeds`]. The gateway binary provides the subxt-backed
//! implementation; tests use an in-memory one.

use std::fmt::Display;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::SourceError;
use crate::types::{
    BlockNumber, ChainEvent, EraIndex, Forcing, HeadData, LeaseOccupant, ParaId, RelayHead,
    SessionIndex,
};

/// On-demand relay-chain storage reads used by the metric derivation.
#[async_trait]
pub trait ChainState: Send + Sync + 'static {
    /// Lease period length in relay-chain blocks (`Slots.LeasePeriod`).
    fn lease_period_length(&self) -> BlockNumber;

    /// `Staking.CurrentEra` as of `at`.
    async fn current_era(&self, at: &RelayHead) -> Result<Option<EraIndex>, SourceError>;

    /// `Staking.ErasStartSessionIndex(era)` as of `at`.
    async fn eras_start_session_index(
        &self,
        at: &RelayHead,
        era: EraIndex,
    ) -> Result<Option<SessionIndex>, SourceError>;

    /// `Staking.ForceEra` as of `at`.
    async fn force_era(&self, at: &RelayHead) -> Result<Forcing, SourceError>;

    /// Current best relay-chain head.
    async fn best_head(&self) -> Result<RelayHead, SourceError>;

    /// `Slots.Leases(para_id)` as of `at`. An absent value is empty.
    async fn leases_at(
        &self,
        at: &RelayHead,
        para_id: ParaId,
    ) -> Result<Vec<Option<LeaseOccupant>>, SourceError>;

    /// `Paras.Heads(para_id)` as of `at`.
    async fn para_head(
        &self,
        at: &RelayHead,
        para_id: ParaId,
    ) -> Result<Option<HeadData>, SourceError>;
}

/// Stream of values from one subscription.
pub type Feed<T> = BoxStream<'static, Result<T, SourceError>>;

/// The three independent push feeds of one node connection.
pub struct ChainFeeds {
    /// Block number of every new best head.
    pub best_heads: Feed<BlockNumber>,
    /// Block number of every new finalized head.
    pub finalized_heads: Feed<BlockNumber>,
    /// Classified events of every new best block.
    pub events: Feed<EventBatch>,
}

/// One block's classified events, in on-chain order.
///
/// Storage reads triggered by these events are made at `block`.
#[derive(Debug, Default)]
pub struct EventBatch {
    pub block: RelayHead,
    pub events: Vec<ChainEvent>,
}

impl EventBatch {
    /// Builds the batch for `block` from the outcome of fetching its events.
    ///
    /// A block whose events cannot be fetched, e.g. one pruned by a reorg,
    /// yields an empty batch: the loss is logged and the feed goes on.
    pub fn from_fetch<E: Display>(block: RelayHead, fetched: Result<Vec<ChainEvent>, E>) -> Self {
        let events = fetched.unwrap_or_else(|e| {
            tracing::warn!(
                number = block.number,
                hash = %block.hash,
                error = %e,
                "failed to fetch block events"
            );
            Vec::new()
        });
        Self { block, events }
    }
}
