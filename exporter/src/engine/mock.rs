//! In-memory [`ChainState`] used by the engine tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use codec::{Compact, Encode};

use crate::error::SourceError;
use crate::metrics::{ExporterMetrics, MetricsRegistry};
use crate::source::ChainState;
use crate::types::{
    BlockHash, BlockNumber, EraIndex, Forcing, HASH_LEN, HeadData, LeaseOccupant, ParaId,
    RelayHead, SessionIndex,
};

/// Fresh, isolated gauge set.
pub(crate) fn test_metrics() -> ExporterMetrics {
    MetricsRegistry::new("test", "testnet")
        .expect("create registry")
        .exporter
}

#[derive(Default)]
pub(crate) struct MockChain {
    pub lease_period: BlockNumber,
    pub head: RelayHead,
    pub current_era: Option<EraIndex>,
    pub era_start: HashMap<EraIndex, SessionIndex>,
    pub forcing: Forcing,
    pub leases: HashMap<ParaId, Vec<Option<LeaseOccupant>>>,
    pub failing: HashSet<ParaId>,
    pub heads: HashMap<ParaId, HeadData>,
    pub head_delays: HashMap<ParaId, Duration>,
    /// Head reads served in order, ahead of `heads`, whatever the para id.
    queued_heads: Mutex<VecDeque<(Duration, HeadData)>>,
    /// Number of storage reads served so far.
    pub reads: AtomicUsize,
    /// Block of every read made at an explicit block.
    read_blocks: Mutex<Vec<BlockHash>>,
}

/// Head data holding a header with the given number.
pub(crate) fn header_with_number(number: BlockNumber) -> HeadData {
    let mut header = vec![0u8; HASH_LEN];
    header.extend(Compact(number).encode());
    header.extend([0u8; HASH_LEN * 2 + 1]);
    HeadData(header)
}

impl MockChain {
    pub fn new(lease_period: BlockNumber, head: RelayHead) -> Self {
        Self {
            lease_period,
            head,
            ..Default::default()
        }
    }

    /// Stores head data holding a header with the given number.
    pub fn set_para_header(&mut self, para_id: ParaId, number: BlockNumber) {
        self.heads.insert(para_id, header_with_number(number));
    }

    /// Queues a head read that answers `number` after `delay`.
    pub fn queue_para_head(&self, delay: Duration, number: BlockNumber) {
        self.queued_heads
            .lock()
            .unwrap()
            .push_back((delay, header_with_number(number)));
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn read_blocks(&self) -> Vec<BlockHash> {
        self.read_blocks.lock().unwrap().clone()
    }

    fn read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn read_at(&self, at: &RelayHead) {
        self.read();
        self.read_blocks.lock().unwrap().push(at.hash);
    }

    fn check(&self, para_id: ParaId) -> Result<(), SourceError> {
        if self.failing.contains(&para_id) {
            return Err(SourceError::Rpc(format!("injected failure for {para_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainState for MockChain {
    fn lease_period_length(&self) -> BlockNumber {
        self.lease_period
    }

    async fn current_era(&self, at: &RelayHead) -> Result<Option<EraIndex>, SourceError> {
        self.read_at(at);
        Ok(self.current_era)
    }

    async fn eras_start_session_index(
        &self,
        at: &RelayHead,
        era: EraIndex,
    ) -> Result<Option<SessionIndex>, SourceError> {
        self.read_at(at);
        Ok(self.era_start.get(&era).copied())
    }

    async fn force_era(&self, at: &RelayHead) -> Result<Forcing, SourceError> {
        self.read_at(at);
        Ok(self.forcing)
    }

    async fn best_head(&self) -> Result<RelayHead, SourceError> {
        self.read();
        Ok(self.head)
    }

    async fn leases_at(
        &self,
        at: &RelayHead,
        para_id: ParaId,
    ) -> Result<Vec<Option<LeaseOccupant>>, SourceError> {
        self.read_at(at);
        assert_eq!(*at, self.head, "leases must be read at the best head");
        self.check(para_id)?;
        Ok(self.leases.get(&para_id).cloned().unwrap_or_default())
    }

    async fn para_head(
        &self,
        at: &RelayHead,
        para_id: ParaId,
    ) -> Result<Option<HeadData>, SourceError> {
        self.read_at(at);
        let queued = self.queued_heads.lock().unwrap().pop_front();
        if let Some((delay, head)) = queued {
            tokio::time::sleep(delay).await;
            return Ok(Some(head));
        }
        if let Some(delay) = self.head_delays.get(&para_id) {
            tokio::time::sleep(*delay).await;
        }
        self.check(para_id)?;
        Ok(self.heads.get(&para_id).cloned())
    }
}
