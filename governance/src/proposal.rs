//! Proposals, per-participant records and their lifecycle states.

use hive_math::Fixed;
use hive_types::{Address, ParamsHash, ProposalId, SchemeId, SnapshotId, Timestamp, VoteOption};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a proposal.
///
/// Moves forward only: Queued ⇄ PreBoosted → Boosted → QuietEndingPeriod,
/// and from any live state to a terminal one. Terminal states never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    None,
    Queued,
    PreBoosted,
    Boosted,
    QuietEndingPeriod,
    Executed,
    Expired,
}

impl ProposalState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Executed | Self::Expired)
    }

    pub fn is_votable(self) -> bool {
        matches!(
            self,
            Self::Queued | Self::PreBoosted | Self::Boosted | Self::QuietEndingPeriod
        )
    }

    pub fn is_stakeable(self) -> bool {
        matches!(self, Self::Queued | Self::PreBoosted)
    }

    pub fn is_boosted(self) -> bool {
        matches!(self, Self::Boosted | Self::QuietEndingPeriod)
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Queued => "queued",
            Self::PreBoosted => "pre-boosted",
            Self::Boosted => "boosted",
            Self::QuietEndingPeriod => "quiet-ending",
            Self::Executed => "executed",
            Self::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// How a proposal was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    None,
    /// Absolute majority reached while Queued or PreBoosted.
    ExecutedInQueue,
    /// Absolute majority reached while Boosted or in the quiet ending.
    QueueBarCrossed,
    /// Boosted deadline reached with Yes ahead.
    ExecutedInBoost,
    /// Boosted deadline reached with No ahead.
    BoostedTimeOut,
    /// Queued period elapsed without a decision.
    QueueTimeOut,
}

/// Result of delivering the decision to the scheme's outcome hook.
///
/// Independent of [`ProposalState`]: a proposal can be Executed while its
/// hook failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackOutcome {
    NotInvoked,
    Succeeded,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub scheme_id: SchemeId,
    pub params_hash: ParamsHash,
    pub proposer: Address,
    pub submitted_at: Timestamp,
    pub state: ProposalState,
    pub execution_state: ExecutionState,
    pub callback: CallbackOutcome,
    /// Current leader. Ties go to No.
    pub winning_vote: VoteOption,
    pub yes_votes: u128,
    pub no_votes: u128,
    pub abstain_votes: u128,
    /// Yes/No weight cast while Queued or PreBoosted.
    pub pre_boosted_yes: u128,
    pub pre_boosted_no: u128,
    /// Reputation actually burned from each side's pre-boosted voters.
    pub pre_boosted_deposit_yes: u128,
    pub pre_boosted_deposit_no: u128,
    pub yes_stakes: u128,
    pub no_stakes: u128,
    /// Threshold recorded when the proposal entered PreBoosted.
    pub confidence_threshold: Fixed,
    pub pre_boosted_at: Option<Timestamp>,
    pub boosted_at: Option<Timestamp>,
    pub current_boosted_period_limit: u64,
    pub quiet_ending_extended: bool,
    pub snapshot: SnapshotId,
    /// Bounty unit for scoring and the DAO bounty paid to Yes stakers.
    pub dao_bounty: u128,
    pub dao_bounty_remain: u128,
    /// Stake still held for this proposal's redemptions.
    pub stake_pool_remaining: u128,
    pub proposer_rewarded: bool,
}

impl Proposal {
    pub fn votes(&self, option: VoteOption) -> u128 {
        match option {
            VoteOption::Yes => self.yes_votes,
            VoteOption::No => self.no_votes,
            VoteOption::Abstain => self.abstain_votes,
        }
    }

    pub(crate) fn votes_mut(&mut self, option: VoteOption) -> &mut u128 {
        match option {
            VoteOption::Yes => &mut self.yes_votes,
            VoteOption::No => &mut self.no_votes,
            VoteOption::Abstain => &mut self.abstain_votes,
        }
    }

    /// Pre-boosted weight on a binding side (zero for Abstain).
    pub fn pre_boosted_votes(&self, option: VoteOption) -> u128 {
        match option {
            VoteOption::Yes => self.pre_boosted_yes,
            VoteOption::No => self.pre_boosted_no,
            VoteOption::Abstain => 0,
        }
    }

    pub fn pre_boosted_deposits(&self, option: VoteOption) -> u128 {
        match option {
            VoteOption::Yes => self.pre_boosted_deposit_yes,
            VoteOption::No => self.pre_boosted_deposit_no,
            VoteOption::Abstain => 0,
        }
    }

    pub fn stakes(&self, option: VoteOption) -> u128 {
        match option {
            VoteOption::Yes => self.yes_stakes,
            VoteOption::No => self.no_stakes,
            VoteOption::Abstain => 0,
        }
    }

    pub fn total_stakes(&self) -> u128 {
        self.yes_stakes.saturating_add(self.no_stakes)
    }

    /// Boosted deadline, when boosted.
    pub fn boosted_deadline(&self) -> Option<Timestamp> {
        self.boosted_at
            .map(|at| at.saturating_add(self.current_boosted_period_limit))
    }
}

/// Per (proposal, voter) record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub option: VoteOption,
    pub weight: u128,
    /// Part of `weight` cast while Queued or PreBoosted.
    pub pre_boosted_weight: u128,
    /// Reputation burned at vote time, settled at redemption.
    pub deposit: u128,
    pub redeemed: bool,
}

/// Per (proposal, staker) record. One side per staker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub option: VoteOption,
    pub amount: u128,
    /// Yes-side stake eligible for the DAO bounty.
    pub amount_for_bounty: u128,
    pub redeemed: bool,
    pub bounty_redeemed: bool,
}

/// A non-binding vote intent awaiting `execute_signaled_vote`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub option: VoteOption,
    pub amount: u128,
}
