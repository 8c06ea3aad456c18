//! Lease-period recomputation.
//!
//! The current lease period index is `relay_head / lease_period_length`.
//! For every watched parachain, the number of consecutive populated lease
//! slots starting at the current period gives the last period it holds.
//! The `para_final_lease_period` flag is 1 when that last period is the
//! current one.
//!
//! A parachain without any lease yields a lease count of zero, which maps
//! to the current period as well, so "no lease" and "lease ends this
//! period" both publish 1. Alerting built on this gauge relies on that,
//! keep it.

use futures::future::join_all;

use crate::source::ChainState;
use crate::types::{BlockNumber, LeaseOccupant, ParaId, RelayHead};

use super::Exporter;

/// Lease period containing `head`, or `None` for a zero period length.
pub fn lease_period_index(head: BlockNumber, lease_period_length: BlockNumber) -> Option<u32> {
    head.checked_div(lease_period_length)
}

/// Number of populated lease slots before the first empty one.
pub fn leading_lease_count(entries: &[Option<LeaseOccupant>]) -> usize {
    entries.iter().take_while(|entry| entry.is_some()).count()
}

/// Index of the last lease period covered by `lease_count` consecutive
/// slots starting at `current`.
pub fn final_lease_period_index(current: u32, lease_count: usize) -> u64 {
    match lease_count {
        0 => u64::from(current),
        n => u64::from(current) + (n as u64 - 1),
    }
}

/// Whether the lease runs out at the end of the current period.
pub fn is_final_lease_period(current: u32, lease_count: usize) -> bool {
    final_lease_period_index(current, lease_count) == u64::from(current)
}

impl<C: ChainState> Exporter<C> {
    /// Recomputes the current lease period index and the final-period flag
    /// of every watched parachain, as of the best relay head.
    pub async fn update_parachain_leases(&self) {
        let head = match self.chain.best_head().await {
            Ok(head) => head,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch relay head, skipping lease update");
                return;
            }
        };

        let period_length = self.chain.lease_period_length();
        let Some(index) = lease_period_index(head.number, period_length) else {
            tracing::warn!("lease period length is zero, skipping lease update");
            return;
        };

        self.metrics
            .current_lease_period_index
            .set(i64::from(index));

        join_all(
            self.watched
                .iter()
                .map(|&para_id| self.update_parachain_lease(&head, index, para_id)),
        )
        .await;
    }

    async fn update_parachain_lease(&self, head: &RelayHead, index: u32, para_id: ParaId) {
        let entries = match self.chain.leases_at(head, para_id).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(%para_id, error = %e, "failed to fetch leases");
                return;
            }
        };

        let lease_count = leading_lease_count(&entries);
        let is_final = is_final_lease_period(index, lease_count);
        tracing::debug!(%para_id, lease_count, is_final, at = %head.hash, "lease status");

        self.metrics
            .para_final_lease_period(para_id)
            .set(i64::from(is_final));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{MockChain, test_metrics};
    use crate::types::{BlockHash, TokenScale};

    fn occupant() -> Option<LeaseOccupant> {
        Some(LeaseOccupant {
            account: [9; 32],
            deposit: 1_000,
        })
    }

    fn exporter(chain: MockChain, watched: &[u32]) -> Exporter<MockChain> {
        Exporter::new(
            chain,
            test_metrics(),
            watched.iter().copied().map(ParaId).collect(),
            TokenScale::from_decimals(0).unwrap(),
        )
    }

    #[test]
    fn index_is_floor_division() {
        assert_eq!(lease_period_index(250, 100), Some(2));
        assert_eq!(lease_period_index(99, 100), Some(0));
        assert_eq!(lease_period_index(300, 100), Some(3));
        assert_eq!(lease_period_index(300, 0), None);
    }

    #[test]
    fn counts_only_leading_populated_slots() {
        assert_eq!(leading_lease_count(&[]), 0);
        assert_eq!(leading_lease_count(&[occupant(), occupant(), occupant()]), 3);
        assert_eq!(leading_lease_count(&[occupant(), None, occupant()]), 1);
        assert_eq!(leading_lease_count(&[None, occupant()]), 0);
    }

    #[test]
    fn final_period_flag() {
        // three periods left: 2, 3, 4
        assert_eq!(final_lease_period_index(2, 3), 4);
        assert!(!is_final_lease_period(2, 3));

        assert_eq!(final_lease_period_index(2, 1), 2);
        assert!(is_final_lease_period(2, 1));

        // no lease at all reads the same as "ends this period"
        assert_eq!(final_lease_period_index(2, 0), 2);
        assert!(is_final_lease_period(2, 0));
    }

    #[test]
    fn final_period_does_not_overflow() {
        assert_eq!(
            final_lease_period_index(u32::MAX, 2),
            u64::from(u32::MAX) + 1
        );
    }

    #[tokio::test]
    async fn publishes_index_and_per_para_flags() {
        let head = RelayHead {
            number: 250,
            hash: BlockHash([4; 32]),
        };
        let mut chain = MockChain::new(100, head);
        chain
            .leases
            .insert(ParaId(1000), vec![occupant(), occupant(), occupant()]);
        chain.leases.insert(ParaId(2000), vec![occupant()]);
        let exporter = exporter(chain, &[1000, 2000, 3000]);

        exporter.update_parachain_leases().await;

        let metrics = exporter.metrics();
        assert_eq!(metrics.current_lease_period_index.get(), 2);
        assert_eq!(metrics.para_final_lease_period(ParaId(1000)).get(), 0);
        assert_eq!(metrics.para_final_lease_period(ParaId(2000)).get(), 1);
        assert_eq!(metrics.para_final_lease_period(ParaId(3000)).get(), 1);
    }

    #[tokio::test]
    async fn one_failing_parachain_does_not_block_the_others() {
        let head = RelayHead {
            number: 250,
            ..Default::default()
        };
        let mut chain = MockChain::new(100, head);
        chain.leases.insert(ParaId(1000), vec![occupant(), occupant()]);
        chain.leases.insert(ParaId(2000), vec![occupant(), occupant()]);
        chain.failing.insert(ParaId(1000));
        let exporter = exporter(chain, &[1000, 2000]);

        exporter.metrics().para_final_lease_period(ParaId(1000)).set(1);
        exporter.update_parachain_leases().await;

        let metrics = exporter.metrics();
        // failed read leaves the previous value in place
        assert_eq!(metrics.para_final_lease_period(ParaId(1000)).get(), 1);
        assert_eq!(metrics.para_final_lease_period(ParaId(2000)).get(), 0);
    }

    #[tokio::test]
    async fn zero_period_length_publishes_nothing() {
        let chain = MockChain::new(
            0,
            RelayHead {
                number: 250,
                ..Default::default()
            },
        );
        let exporter = exporter(chain, &[1000]);
        exporter.metrics().current_lease_period_index.set(7);

        exporter.update_parachain_leases().await;

        assert_eq!(exporter.metrics().current_lease_period_index.get(), 7);
        assert_eq!(exporter.chain().reads(), 1);
    }
}
