//! Fundamental types for the Hive voting engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, identifiers, keys, timestamps, vote options, and the narrow
//! collaborator traits (clock, reputation, stake token) the engine consumes.

pub mod address;
pub mod collab;
pub mod error;
pub mod hash;
pub mod keys;
pub mod time;
pub mod vote;

pub use address::Address;
pub use collab::{
    Clock, FungibleToken, ReputationError, ReputationLedger, SnapshotId, TokenError,
    WeightProvider,
};
pub use error::HiveError;
pub use hash::{Digest, ParamsHash, ProposalId, SchemeId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;
pub use vote::{ActionType, VoteOption};
