//! Core domain types used by the exporter.
//!
//! These mirror the handful of relay-chain values the exporter cares
//! about (heads, eras, lease slots, parachain head data) as strongly-typed
//! newtypes, together with the SCALE shapes used to decode them from raw
//! storage bytes.

use std::fmt;

use codec::{Compact, Decode};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, SourceError};

/// Chain events and their classification.
pub mod event;

pub use event::{CandidateIncluded, ChainEvent, Decoded, EventKind};

/// Relay-chain and parachain block numbers.
pub type BlockNumber = u32;

/// Staking era index.
pub type EraIndex = u32;

/// Session index.
pub type SessionIndex = u32;

/// Native token balance.
pub type Balance = u128;

/// Length in bytes of block hashes and account identifiers.
pub const HASH_LEN: usize = 32;

/// Parachain identifier.
///
/// Used as the `para_id` label on per-parachain gauges, so its
/// [`fmt::Display`] form is the plain decimal id.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParaId(pub u32);

impl ParaId {
    /// Label value used for this parachain's gauge series.
    pub fn label(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ParaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ParaId {
    fn from(id: u32) -> Self {
        ParaId(id)
    }
}

/// Strongly-typed 256-bit block hash.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default)]
pub struct BlockHash(pub [u8; HASH_LEN]);

impl BlockHash {
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Relay-chain head used as the point-in-time anchor for storage reads.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct RelayHead {
    pub number: BlockNumber,
    pub hash: BlockHash,
}

/// Staking force-era mode (`Staking.ForceEra`).
///
/// Variant order matches the on-chain SCALE indices.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Decode)]
pub enum Forcing {
    /// Not forcing anything, eras change on their normal cadence.
    #[default]
    NotForcing,
    /// Force a new era at the next session boundary, then reset.
    ForceNew,
    /// Avoid new eras indefinitely.
    ForceNone,
    /// Force a new era at the end of every session.
    ForceAlways,
}

impl Forcing {
    pub fn decode_from(mut bytes: &[u8]) -> Result<Self, DecodeError> {
        Forcing::decode(&mut bytes).map_err(|e| DecodeError::new("Staking.ForceEra", e))
    }
}

/// Occupant of one lease period slot: the leaser and its deposit.
#[derive(Clone, Debug, Eq, PartialEq, Decode)]
pub struct LeaseOccupant {
    pub account: [u8; HASH_LEN],
    pub deposit: Balance,
}

/// Decodes a `Slots.Leases` value, one entry per upcoming lease period
/// starting with the current one.
pub fn decode_leases(mut bytes: &[u8]) -> Result<Vec<Option<LeaseOccupant>>, DecodeError> {
    Vec::<Option<LeaseOccupant>>::decode(&mut bytes)
        .map_err(|e| DecodeError::new("Slots.Leases", e))
}

/// Decodes a plain SCALE `u32` storage value or constant.
pub fn decode_u32(what: &'static str, mut bytes: &[u8]) -> Result<u32, DecodeError> {
    u32::decode(&mut bytes).map_err(|e| DecodeError::new(what, e))
}

/// Opaque parachain head data as stored in `Paras.Heads`.
#[derive(Clone, Debug, Eq, PartialEq, Default, Decode)]
pub struct HeadData(pub Vec<u8>);

/// Leading fields of a parachain block header.
///
/// Everything after the block number (state root, digest, ...) is left
/// undecoded.
#[derive(Decode)]
struct HeaderPrefix {
    _parent_hash: [u8; HASH_LEN],
    number: Compact<BlockNumber>,
}

impl HeadData {
    /// Decodes a `Paras.Heads` storage value.
    pub fn decode_from(mut bytes: &[u8]) -> Result<Self, DecodeError> {
        HeadData::decode(&mut bytes).map_err(|e| DecodeError::new("Paras.Heads", e))
    }

    /// Interprets the head data as a block header and returns its number.
    pub fn block_number(&self) -> Result<BlockNumber, DecodeError> {
        let mut input = self.0.as_slice();
        let prefix = HeaderPrefix::decode(&mut input)
            .map_err(|e| DecodeError::new("parachain header", e))?;
        Ok(prefix.number.0)
    }
}

/// Divisor that turns raw balances into whole tokens (`10^decimals`).
///
/// Fixed for the lifetime of one connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TokenScale(u128);

impl TokenScale {
    pub fn from_decimals(decimals: u32) -> Result<Self, SourceError> {
        10u128
            .checked_pow(decimals)
            .map(TokenScale)
            .ok_or_else(|| SourceError::Unsupported(format!("token decimals {decimals}")))
    }

    pub fn get(&self) -> u128 {
        self.0
    }

    /// Scales `amount` down to whole tokens, truncating.
    pub fn scale(&self, amount: Balance) -> Balance {
        amount / self.0
    }
}
