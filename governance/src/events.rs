//! Events emitted by the engine for off-chain observers.
//!
//! The engine appends to an internal log during each operation; callers
//! drain it with [`Engine::take_events`](crate::Engine::take_events).
//! Events from an operation that fails are discarded with its other effects.

use crate::proposal::{CallbackOutcome, ExecutionState, ProposalState};
use hive_math::Fixed;
use hive_types::{ActionType, Address, Digest, ParamsHash, ProposalId, SchemeId, VoteOption};

#[derive(Clone, Debug, PartialEq)]
pub enum GovernanceEvent {
    ParametersRegistered {
        params_hash: ParamsHash,
    },
    SchemeRegistered {
        scheme_id: SchemeId,
        scheme: Address,
        owner: Address,
    },
    NewProposal {
        proposal_id: ProposalId,
        scheme_id: SchemeId,
        proposer: Address,
        params_hash: ParamsHash,
        dao_bounty: u128,
    },
    Vote {
        proposal_id: ProposalId,
        scheme_id: SchemeId,
        voter: Address,
        option: VoteOption,
        weight: u128,
    },
    VoteSignaled {
        proposal_id: ProposalId,
        voter: Address,
        option: VoteOption,
        amount: u128,
    },
    Stake {
        proposal_id: ProposalId,
        scheme_id: SchemeId,
        staker: Address,
        option: VoteOption,
        amount: u128,
    },
    StateChange {
        proposal_id: ProposalId,
        from: ProposalState,
        to: ProposalState,
    },
    /// The recorded pre-boost confidence was lowered to the current threshold.
    ConfidenceLevelChange {
        proposal_id: ProposalId,
        confidence_threshold: Fixed,
    },
    ExecuteProposal {
        proposal_id: ProposalId,
        scheme_id: SchemeId,
        decision: VoteOption,
        execution_state: ExecutionState,
        total_weight: u128,
    },
    CallbackResult {
        proposal_id: ProposalId,
        outcome: CallbackOutcome,
    },
    Redeem {
        proposal_id: ProposalId,
        beneficiary: Address,
        amount: u128,
    },
    RedeemReputation {
        proposal_id: ProposalId,
        beneficiary: Address,
        amount: u128,
    },
    RedeemDaoBounty {
        proposal_id: ProposalId,
        beneficiary: Address,
        amount: u128,
    },
    ActionSigned {
        proposal_id: ProposalId,
        signer: Address,
        option: VoteOption,
        amount: u128,
        nonce: u64,
        action_type: ActionType,
        digest: Digest,
    },
    BountyPoolFunded {
        scheme_id: SchemeId,
        amount: u128,
    },
    RefundPolicySet {
        scheme_id: SchemeId,
        unit_cost: u128,
        max_rate: u128,
    },
    RefundBalanceFunded {
        scheme_id: SchemeId,
        amount: u128,
    },
    RefundBalanceWithdrawn {
        scheme_id: SchemeId,
        amount: u128,
    },
    GasRefunded {
        scheme_id: SchemeId,
        beneficiary: Address,
        amount: u128,
    },
}

impl GovernanceEvent {
    /// The proposal this event concerns, if any.
    pub fn proposal_id(&self) -> Option<ProposalId> {
        use GovernanceEvent::*;
        match self {
            NewProposal { proposal_id, .. }
            | Vote { proposal_id, .. }
            | VoteSignaled { proposal_id, .. }
            | Stake { proposal_id, .. }
            | StateChange { proposal_id, .. }
            | ConfidenceLevelChange { proposal_id, .. }
            | ExecuteProposal { proposal_id, .. }
            | CallbackResult { proposal_id, .. }
            | Redeem { proposal_id, .. }
            | RedeemReputation { proposal_id, .. }
            | RedeemDaoBounty { proposal_id, .. }
            | ActionSigned { proposal_id, .. } => Some(*proposal_id),
            ParametersRegistered { .. }
            | SchemeRegistered { .. }
            | BountyPoolFunded { .. }
            | RefundPolicySet { .. }
            | RefundBalanceFunded { .. }
            | RefundBalanceWithdrawn { .. }
            | GasRefunded { .. } => None,
        }
    }
}
