//! Token stakes that drive boosting.

use hive_types::{Address, ProposalId, VoteOption};

use crate::engine::{Engine, TxContext, Undo};
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::proposal::StakeRecord;

impl Engine {
    /// Stake `amount` tokens on `option` (Yes or No).
    ///
    /// Only Queued and PreBoosted proposals accept stakes. A staker already
    /// holding the other side gets a silent no-op. Returns true when the
    /// proposal resolved during this call.
    pub fn stake(
        &mut self,
        ctx: &TxContext,
        id: &ProposalId,
        option: VoteOption,
        amount: u128,
    ) -> Result<bool, GovernanceError> {
        let id = *id;
        let staker = ctx.sender.clone();
        self.guarded(id, |engine| engine.internal_stake(id, &staker, option, amount))
    }

    pub(crate) fn internal_stake(
        &mut self,
        id: ProposalId,
        staker: &Address,
        option: VoteOption,
        amount: u128,
    ) -> Result<bool, GovernanceError> {
        if !option.is_binding() {
            return Err(GovernanceError::InvalidOption {
                proposal_id: id,
                option,
            });
        }
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount { proposal_id: id });
        }
        let state = self.proposal_ref(&id)?.state;
        if !state.is_stakeable() {
            return Err(GovernanceError::NotStakeable {
                proposal_id: id,
                state,
            });
        }
        if self.advance(id)? {
            return Ok(true);
        }

        let mut p = self.proposal_ref(&id)?.clone();
        if !p.state.is_stakeable() {
            tracing::debug!(%id, state = %p.state, "stake arrived after boosting, ignored");
            return Ok(false);
        }
        let key = (id, staker.clone());
        let existing = self.state.stakes.get(&key).cloned();
        if let Some(record) = &existing {
            if record.amount > 0 && record.option != option {
                tracing::debug!(%id, %staker, held = %record.option, "opposite-side stake ignored");
                return Ok(false);
            }
        }

        let overflow = || GovernanceError::Overflow("stake total");
        let staked = existing
            .as_ref()
            .map_or(0, |r| r.amount)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        let side_total = p.stakes(option).checked_add(amount).ok_or_else(overflow)?;
        p.total_stakes().checked_add(amount).ok_or_else(overflow)?;
        let pool = p.stake_pool_remaining.checked_add(amount).ok_or_else(overflow)?;
        let escrow = self
            .scheme_ref(&p.scheme_id)?
            .escrow
            .checked_add(amount)
            .ok_or_else(overflow)?;

        self.collab
            .stake_token
            .lock(staker, amount)
            .map_err(|source| GovernanceError::StakeTransfer {
                proposal_id: id,
                source,
            })?;
        self.undo.push(Undo::Locked {
            owner: staker.clone(),
            amount,
        });

        match option {
            VoteOption::Yes => p.yes_stakes = side_total,
            _ => p.no_stakes = side_total,
        }
        p.stake_pool_remaining = pool;
        let scheme_id = p.scheme_id;
        *self.proposal_mut(&id)? = p;
        self.scheme_mut(&scheme_id)?.escrow = escrow;

        self.undo.push(Undo::Stake {
            key: key.clone(),
            previous: existing,
        });
        let record = self.state.stakes.entry(key).or_insert(StakeRecord {
            option,
            amount: 0,
            amount_for_bounty: 0,
            redeemed: false,
            bounty_redeemed: false,
        });
        record.option = option;
        record.amount = staked;
        if option == VoteOption::Yes {
            record.amount_for_bounty = staked;
        }

        tracing::debug!(%id, %staker, %option, amount, "stake recorded");
        self.emit(GovernanceEvent::Stake {
            proposal_id: id,
            scheme_id,
            staker: staker.clone(),
            option,
            amount,
        });
        self.advance(id)
    }
}
