//! Chain events as seen by the exporter.
//!
//! Raw events arrive as `(pallet, variant, field bytes)` triples. They are
//! classified exactly once, here, into the closed [`ChainEvent`] set. A
//! recognised event whose payload does not decode keeps its kind and
//! carries the [`DecodeError`], so each consumer can log and skip that
//! single event without re-inspecting raw bytes.

use codec::Decode;

use super::{Balance, HASH_LEN, HeadData, ParaId, SessionIndex};
use crate::error::DecodeError;

/// Result of decoding a recognised event's payload.
pub type Decoded<T> = Result<T, DecodeError>;

/// The event kinds the exporter reacts to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EventKind {
    Slashed,
    NewSession,
    CandidateIncluded,
}

impl EventKind {
    /// Matches an event's pallet and variant names exactly.
    pub fn classify(pallet: &str, variant: &str) -> Option<Self> {
        match (pallet, variant) {
            ("Staking", "Slashed") => Some(EventKind::Slashed),
            ("Session", "NewSession") => Some(EventKind::NewSession),
            ("ParaInclusion", "CandidateIncluded") => Some(EventKind::CandidateIncluded),
            _ => None,
        }
    }
}

/// Payload of a `ParaInclusion.CandidateIncluded` event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CandidateIncluded {
    pub para_id: ParaId,
    pub head_data: HeadData,
}

/// A classified chain event.
#[derive(Debug)]
pub enum ChainEvent {
    /// `Staking.Slashed`: slashed amount in raw balance units.
    Slashed(Decoded<Balance>),
    /// `Session.NewSession`: index of the session that just started.
    NewSession(Decoded<SessionIndex>),
    /// `ParaInclusion.CandidateIncluded`.
    CandidateIncluded(Decoded<CandidateIncluded>),
    Other,
}

/// `Staking.Slashed { staker, amount }`.
#[derive(Decode)]
struct SlashedFields {
    _staker: [u8; HASH_LEN],
    amount: Balance,
}

/// Leading part of a candidate receipt: the descriptor plus the
/// commitments hash. Only `para_id` is used.
#[derive(Decode)]
struct CandidateReceiptFields {
    para_id: u32,
    _relay_parent: [u8; HASH_LEN],
    _collator: [u8; HASH_LEN],
    _persisted_validation_data_hash: [u8; HASH_LEN],
    _pov_hash: [u8; HASH_LEN],
    _erasure_root: [u8; HASH_LEN],
    _signature: [u8; 64],
    _para_head: [u8; HASH_LEN],
    _validation_code_hash: [u8; HASH_LEN],
    _commitments_hash: [u8; HASH_LEN],
}

impl ChainEvent {
    /// Classifies and decodes one raw event.
    pub fn from_raw(pallet: &str, variant: &str, fields: &[u8]) -> Self {
        let mut input = fields;
        match EventKind::classify(pallet, variant) {
            Some(EventKind::Slashed) => ChainEvent::Slashed(
                SlashedFields::decode(&mut input)
                    .map(|f| f.amount)
                    .map_err(|e| DecodeError::new("Staking.Slashed", e)),
            ),
            Some(EventKind::NewSession) => ChainEvent::NewSession(
                SessionIndex::decode(&mut input)
                    .map_err(|e| DecodeError::new("Session.NewSession", e)),
            ),
            Some(EventKind::CandidateIncluded) => ChainEvent::CandidateIncluded(
                <(CandidateReceiptFields, HeadData)>::decode(&mut input)
                    .map(|(receipt, head_data)| CandidateIncluded {
                        para_id: ParaId(receipt.para_id),
                        head_data,
                    })
                    .map_err(|e| DecodeError::new("ParaInclusion.CandidateIncluded", e)),
            ),
            None => ChainEvent::Other,
        }
    }

    pub fn kind(&self) -> Option<EventKind> {
        match self {
            ChainEvent::Slashed(_) => Some(EventKind::Slashed),
            ChainEvent::NewSession(_) => Some(EventKind::NewSession),
            ChainEvent::CandidateIncluded(_) => Some(EventKind::CandidateIncluded),
            ChainEvent::Other => None,
        }
    }
}
