use hive_math::MathError;
use hive_types::{
    Address, ParamsHash, ProposalId, ReputationError, SchemeId, Timestamp, TokenError, VoteOption,
};
use thiserror::Error;

use crate::proposal::ProposalState;

#[derive(Debug, Error)]
pub enum GovernanceError {
    // ── validation ──────────────────────────────────────────────────────
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("option {option} is not accepted for this action on {proposal_id}")]
    InvalidOption {
        proposal_id: ProposalId,
        option: VoteOption,
    },

    #[error("amount must be greater than zero on {proposal_id}")]
    ZeroAmount { proposal_id: ProposalId },

    #[error("{voter} has no voting weight on {proposal_id}")]
    NoVotingWeight {
        proposal_id: ProposalId,
        voter: Address,
    },

    #[error("{voter} requested {requested} weight on {proposal_id} but only {available} is available")]
    InsufficientWeight {
        proposal_id: ProposalId,
        voter: Address,
        requested: u128,
        available: u128,
    },

    #[error("{voter} already voted {existing} on {proposal_id}, cannot switch to {attempted}")]
    SideSwitch {
        proposal_id: ProposalId,
        voter: Address,
        existing: VoteOption,
        attempted: VoteOption,
    },

    #[error("no signaled vote from {voter} on {proposal_id}")]
    NoSignal {
        proposal_id: ProposalId,
        voter: Address,
    },

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("threshold math: {0}")]
    Math(#[from] MathError),

    #[error("corrupt engine snapshot: {0}")]
    Snapshot(String),

    // ── state ───────────────────────────────────────────────────────────
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("scheme {0} not found")]
    SchemeNotFound(SchemeId),

    #[error("parameters {0} are not registered")]
    UnknownParameters(ParamsHash),

    #[error("parameters {params} activate at {activation_time}, now {now}")]
    NotActive {
        params: ParamsHash,
        activation_time: Timestamp,
        now: Timestamp,
    },

    #[error("proposal {proposal_id} is not votable in state {state}")]
    NotVotable {
        proposal_id: ProposalId,
        state: ProposalState,
    },

    #[error("proposal {proposal_id} is not stakeable in state {state}")]
    NotStakeable {
        proposal_id: ProposalId,
        state: ProposalState,
    },

    #[error("proposal {proposal_id} is not resolved yet (state {state})")]
    NotTerminal {
        proposal_id: ProposalId,
        state: ProposalState,
    },

    // ── authorization ───────────────────────────────────────────────────
    #[error(
        "wrong signer on {proposal_id}: expected {expected}, recovered {}",
        .recovered.as_ref().map_or("nothing", |a| a.as_str())
    )]
    WrongSigner {
        proposal_id: ProposalId,
        expected: Address,
        recovered: Option<Address>,
    },

    #[error("caller {actual} is not {expected}")]
    Unauthorized { expected: Address, actual: Address },

    // ── resource ────────────────────────────────────────────────────────
    #[error("stake transfer on {proposal_id} failed: {source}")]
    StakeTransfer {
        proposal_id: ProposalId,
        #[source]
        source: TokenError,
    },

    #[error("transfer for scheme {scheme_id} failed: {source}")]
    FundsTransfer {
        scheme_id: SchemeId,
        #[source]
        source: TokenError,
    },

    #[error("reputation ledger: {0}")]
    Reputation(#[from] ReputationError),

    #[error("scheme {scheme_id} escrow holds {available}, need {needed}")]
    InsufficientEscrow {
        scheme_id: SchemeId,
        needed: u128,
        available: u128,
    },

    #[error("scheme {scheme_id} bounty pool holds {available}, need {needed}")]
    InsufficientBountyPool {
        scheme_id: SchemeId,
        needed: u128,
        available: u128,
    },

    #[error("scheme {scheme_id} refund balance holds {available}, requested {requested}")]
    InsufficientRefundBalance {
        scheme_id: SchemeId,
        requested: u128,
        available: u128,
    },

    // ── re-entrancy ─────────────────────────────────────────────────────
    #[error("proposal {0} is already being processed")]
    Reentrancy(ProposalId),

    #[error("scheme {0} is running its outcome hook")]
    SchemeBusy(SchemeId),
}

/// Coarse classification used by callers that only care about the family of
/// failure (e.g. to decide whether a retry with other inputs makes sense).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    State,
    Authorization,
    Resource,
    Reentrancy,
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        use GovernanceError::*;
        match self {
            InvalidParameters(_) | InvalidOption { .. } | ZeroAmount { .. }
            | NoVotingWeight { .. } | InsufficientWeight { .. } | SideSwitch { .. }
            | NoSignal { .. } | Overflow(_) | Math(_) | Snapshot(_) => ErrorKind::Validation,
            ProposalNotFound(_) | SchemeNotFound(_) | UnknownParameters(_) | NotActive { .. }
            | NotVotable { .. } | NotStakeable { .. } | NotTerminal { .. } => ErrorKind::State,
            WrongSigner { .. } | Unauthorized { .. } => {
                ErrorKind::Authorization
            }
            StakeTransfer { .. } | FundsTransfer { .. } | Reputation(_)
            | InsufficientEscrow { .. } | InsufficientBountyPool { .. }
            | InsufficientRefundBalance { .. } => ErrorKind::Resource,
            Reentrancy(_) | SchemeBusy(_) => ErrorKind::Reentrancy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_signer_reports_both_sides() {
        let err = GovernanceError::WrongSigner {
            proposal_id: ProposalId::ZERO,
            expected: Address::new("hive_alice"),
            recovered: None,
        };
        let text = err.to_string();
        assert!(text.contains("hive_alice"));
        assert!(text.contains("recovered nothing"));
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn token_failures_are_resource_errors() {
        let err = GovernanceError::StakeTransfer {
            proposal_id: ProposalId::ZERO,
            source: TokenError::Rejected("paused".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Resource);
    }
}
