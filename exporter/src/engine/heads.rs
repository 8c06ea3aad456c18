//! Parachain head extraction.
//!
//! Every `ParaInclusion.CandidateIncluded` event names the parachain whose
//! candidate was included. For each one, the parachain's current head data
//! is read from relay-chain storage at the including block and its header
//! number published.
//! Reads run concurrently and each writes only its own `para_id` series;
//! if one parachain appears twice in a block, whichever read finishes last
//! wins.

use futures::future::join_all;

use crate::source::ChainState;
use crate::types::{CandidateIncluded, Decoded, ParaId, RelayHead};

use super::Exporter;

impl<C: ChainState> Exporter<C> {
    /// Publishes the best block of every parachain included in a block.
    pub async fn update_parachain_heads(
        &self,
        at: &RelayHead,
        inclusions: &[&Decoded<CandidateIncluded>],
    ) {
        let para_ids = inclusions.iter().filter_map(|inclusion| match inclusion {
            Ok(candidate) => Some(candidate.para_id),
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode included candidate, skipping");
                None
            }
        });

        join_all(para_ids.map(|para_id| self.update_parachain_head(at, para_id))).await;
    }

    async fn update_parachain_head(&self, at: &RelayHead, para_id: ParaId) {
        let head = match self.chain.para_head(at, para_id).await {
            Ok(Some(head)) => head,
            Ok(None) => {
                tracing::debug!(%para_id, "no head data stored");
                return;
            }
            Err(e) => {
                tracing::warn!(%para_id, error = %e, "failed to fetch parachain head");
                return;
            }
        };

        match head.block_number() {
            Ok(number) => {
                tracing::debug!(%para_id, number, "new parachain head");
                self.metrics
                    .para_best_block(para_id)
                    .set(i64::from(number));
            }
            Err(e) => {
                tracing::warn!(%para_id, error = %e, "failed to decode parachain header");
            }
        }
    }
}
