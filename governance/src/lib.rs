//! Boosted-consensus voting engine.
//!
//! Schemes open proposals; reputation holders vote and token holders stake.
//! Most proposals resolve by absolute majority while queued. Proposals whose
//! Yes-stake clears an exponential threshold are boosted onto a fast track
//! where a relative majority at the deadline decides.
//!
//! - [`params`]: registered, hash-addressed parameter sets
//! - [`lifecycle`]: the state machine (Queued ⇄ PreBoosted → Boosted → resolved)
//! - [`voting`] / [`staking`]: vote and stake bookkeeping
//! - [`redemption`]: payouts after resolution
//! - [`refund`]: prepaid gas refunds for voters
//! - [`signed`]: relayable off-chain signed actions
//! - [`hooks`]: scheme outcome callbacks

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod hooks;
pub mod lifecycle;
pub mod params;
pub mod proposal;
pub mod redemption;
pub mod refund;
pub mod scheme;
pub mod signed;
pub mod staking;
pub mod state;
pub mod voting;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Collaborators, Engine, TxContext};
pub use error::{ErrorKind, GovernanceError};
pub use events::GovernanceEvent;
pub use hooks::{HookError, OutcomeHook, Resolution};
pub use params::{Parameters, RegisteredParams, PARAMS_LEN};
pub use proposal::{
    CallbackOutcome, ExecutionState, Proposal, ProposalState, SignalRecord, StakeRecord,
    VoteRecord,
};
pub use redemption::Redemption;
pub use scheme::{RefundPolicy, SchemeRecord};
pub use signed::{action_digest, SignedAction, SignedIntent};
pub use state::LedgerState;
