//! Serializable ledger state and engine snapshots.
//!
//! Everything the engine owns except its collaborators and registered hooks
//! is kept in [`LedgerState`]. Snapshots are bincode-encoded.

use std::collections::HashMap;

use hive_types::{Address, ParamsHash, ProposalId, SchemeId};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::GovernanceError;
use crate::params::RegisteredParams;
use crate::proposal::{Proposal, SignalRecord, StakeRecord, VoteRecord};
use crate::scheme::SchemeRecord;
use crate::signed::SignedIntent;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) parameters: HashMap<ParamsHash, RegisteredParams>,
    pub(crate) schemes: HashMap<SchemeId, SchemeRecord>,
    pub(crate) proposals: HashMap<ProposalId, Proposal>,
    /// Proposal ids per scheme in creation order.
    pub(crate) scheme_proposals: HashMap<SchemeId, Vec<ProposalId>>,
    pub(crate) votes: HashMap<(ProposalId, Address), VoteRecord>,
    pub(crate) stakes: HashMap<(ProposalId, Address), StakeRecord>,
    pub(crate) signals: HashMap<(ProposalId, Address), SignalRecord>,
    pub(crate) nonces: HashMap<Address, u64>,
    pub(crate) intents: HashMap<(Address, u64), SignedIntent>,
    /// Uniqueness nonce for proposal ids.
    pub(crate) proposal_nonce: u64,
}

impl Engine {
    /// Serialize the ledger state. Hooks and collaborators are not included.
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        bincode::serialize(&self.state).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    /// Replace the ledger state with a snapshot from [`Engine::save_state`].
    ///
    /// Refused while any operation is in progress (i.e. from inside a hook).
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), GovernanceError> {
        if !self.in_flight.is_empty() {
            return Err(GovernanceError::Snapshot(
                "cannot load a snapshot while an operation is in progress".to_string(),
            ));
        }
        let state: LedgerState =
            bincode::deserialize(data).map_err(|e| GovernanceError::Snapshot(e.to_string()))?;
        tracing::info!(
            proposals = state.proposals.len(),
            schemes = state.schemes.len(),
            "engine state loaded"
        );
        self.state = state;
        Ok(())
    }
}
