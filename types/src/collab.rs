//! Narrow collaborator contracts consumed by the voting engine.
//!
//! Every external dependency (time, reputation, stake token) sits behind one
//! of these traits. Production wiring supplies real implementations; tests use
//! the deterministic ones from `hive-nullables`.

use crate::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a pinned reputation snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub u64);

/// Ambient, monotonically non-decreasing time source.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Reputation (voting power) queries pinned to a snapshot.
///
/// A snapshot is taken when a proposal is created, so later weight changes
/// never affect a proposal already in flight.
pub trait WeightProvider {
    /// Pin the current weights and return the snapshot handle.
    fn snapshot(&self) -> SnapshotId;

    fn weight_of(&self, account: &Address, snapshot: SnapshotId) -> u128;

    fn total_weight_at(&self, snapshot: SnapshotId) -> u128;
}

/// Reputation bookkeeping used for voter deposits and redemption rewards.
pub trait ReputationLedger {
    fn mint(&self, to: &Address, amount: u128) -> Result<(), ReputationError>;

    /// Burn up to `amount` from `from`, returning the amount actually burned.
    fn burn(&self, from: &Address, amount: u128) -> Result<u128, ReputationError>;
}

/// Fungible token with an escrow held on behalf of the engine.
pub trait FungibleToken {
    fn balance_of(&self, owner: &Address) -> u128;

    /// Move `amount` from `owner` into engine escrow.
    fn lock(&self, owner: &Address, amount: u128) -> Result<(), TokenError>;

    /// Move `amount` out of engine escrow to `to`.
    fn release(&self, to: &Address, amount: u128) -> Result<(), TokenError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance for {owner}: need {needed}, have {available}")]
    InsufficientBalance {
        owner: Address,
        needed: u128,
        available: u128,
    },

    #[error("insufficient escrow: need {needed}, have {available}")]
    InsufficientEscrow { needed: u128, available: u128 },

    #[error("token transfer rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReputationError {
    #[error("reputation supply overflow minting {amount} to {account}")]
    Overflow { account: Address, amount: u128 },

    #[error("reputation update rejected: {0}")]
    Rejected(String),
}
