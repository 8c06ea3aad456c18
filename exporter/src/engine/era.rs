//! Era-change detection.
//!
//! A block starts a new era when it carries a `Session.NewSession` event
//! and either the staking pallet forces a new era every session, or the
//! new session is exactly the recorded start session of the current era.
//! Storage is only consulted when a session change is present, and is read
//! at the block that carried the event.
//!
//! Any missing value, decode failure or read failure is reported as "no
//! change": the slash total must never be reset spuriously.

use crate::error::SourceError;
use crate::source::ChainState;
use crate::types::{Decoded, Forcing, RelayHead, SessionIndex};

use super::Exporter;

/// Decides whether a new session also started a new era.
pub fn era_changed(forcing: Forcing, era_start: SessionIndex, new_session: SessionIndex) -> bool {
    forcing == Forcing::ForceAlways || era_start == new_session
}

impl<C: ChainState> Exporter<C> {
    /// Returns `true` if the given session changes mark an era boundary.
    pub async fn is_new_era(
        &self,
        at: &RelayHead,
        session_changes: &[&Decoded<SessionIndex>],
    ) -> bool {
        match self.detect_era_change(at, session_changes).await {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read era state, assuming no era change");
                false
            }
        }
    }

    async fn detect_era_change(
        &self,
        at: &RelayHead,
        session_changes: &[&Decoded<SessionIndex>],
    ) -> Result<bool, SourceError> {
        let Some(first) = session_changes.first() else {
            return Ok(false);
        };

        let Some(era) = self.chain.current_era(at).await? else {
            tracing::debug!("no current era set");
            return Ok(false);
        };

        let Some(era_start) = self.chain.eras_start_session_index(at, era).await? else {
            tracing::debug!(era, "no start session recorded for era");
            return Ok(false);
        };

        let new_session = match first {
            Ok(index) => *index,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode NewSession event");
                return Ok(false);
            }
        };

        let forcing = self.chain.force_era(at).await?;
        tracing::debug!(era, era_start, new_session, ?forcing, "checking for era change");
        Ok(era_changed(forcing, era_start, new_session))
    }

    /// Resets the era slash total and recomputes lease status when the
    /// block's session changes start a new era.
    pub async fn check_new_era(
        &self,
        at: &RelayHead,
        session_changes: &[&Decoded<SessionIndex>],
    ) {
        if !self.is_new_era(at, session_changes).await {
            return;
        }

        tracing::info!("new era started, resetting slash total");
        self.metrics.active_era_slashes_total.set(0.0);
        self.update_parachain_leases().await;
    }
}
