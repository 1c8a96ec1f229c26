//! Reputation-weighted votes.

use hive_types::{Address, ProposalId, VoteOption};

use crate::engine::{Engine, TxContext, Undo};
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::params::percent_of;
use crate::proposal::{ProposalState, SignalRecord, VoteRecord};

impl Engine {
    /// Vote with `amount` of the caller's snapshot weight; zero means all
    /// of what is still available.
    ///
    /// Returns true when the proposal resolved during this call. A direct
    /// vote that was actually recorded is eligible for the scheme's gas
    /// refund; one that only resolved an expired proposal is not.
    pub fn vote(
        &mut self,
        ctx: &TxContext,
        id: &ProposalId,
        option: VoteOption,
        amount: u128,
    ) -> Result<bool, GovernanceError> {
        let id = *id;
        let voter = ctx.sender.clone();
        let before = self.vote_record(&id, &voter).map_or(0, |r| r.weight);
        let resolved = self.guarded(id, |engine| {
            engine.internal_vote(id, &voter, option, amount)
        })?;
        let after = self.vote_record(&id, &voter).map_or(0, |r| r.weight);
        if after > before {
            let scheme_id = self.proposal_ref(&id)?.scheme_id;
            self.refund_vote(ctx, &scheme_id);
        }
        Ok(resolved)
    }

    /// Record a non-binding intent to vote. Applied later by
    /// [`Engine::execute_signaled_vote`].
    pub fn signal_vote(
        &mut self,
        ctx: &TxContext,
        id: &ProposalId,
        option: VoteOption,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        let state = self.proposal_ref(id)?.state;
        if !state.is_votable() {
            return Err(GovernanceError::NotVotable {
                proposal_id: *id,
                state,
            });
        }
        self.state
            .signals
            .insert((*id, ctx.sender.clone()), SignalRecord { option, amount });
        tracing::debug!(proposal = %id, voter = %ctx.sender, %option, amount, "vote signaled");
        self.emit(GovernanceEvent::VoteSignaled {
            proposal_id: *id,
            voter: ctx.sender.clone(),
            option,
            amount,
        });
        Ok(())
    }

    /// Apply `voter`'s signaled vote. Anyone may call; no refund is paid.
    pub fn execute_signaled_vote(
        &mut self,
        id: &ProposalId,
        voter: &Address,
    ) -> Result<bool, GovernanceError> {
        let id = *id;
        let signal = self
            .state
            .signals
            .get(&(id, voter.clone()))
            .cloned()
            .ok_or_else(|| GovernanceError::NoSignal {
                proposal_id: id,
                voter: voter.clone(),
            })?;
        let resolved = self.guarded(id, |engine| {
            engine.internal_vote(id, voter, signal.option, signal.amount)
        })?;
        self.state.signals.remove(&(id, voter.clone()));
        Ok(resolved)
    }

    /// Shared vote path for direct, signaled and signed votes.
    pub(crate) fn internal_vote(
        &mut self,
        id: ProposalId,
        voter: &Address,
        option: VoteOption,
        amount: u128,
    ) -> Result<bool, GovernanceError> {
        let state = self.proposal_ref(&id)?.state;
        if !state.is_votable() {
            return Err(GovernanceError::NotVotable {
                proposal_id: id,
                state,
            });
        }
        if self.advance(id)? {
            return Ok(true);
        }

        let now = self.now();
        let mut p = self.proposal_ref(&id)?.clone();
        let params = self.params_ref(&p.params_hash)?.params.clone();
        let key = (id, voter.clone());
        let existing = self.state.votes.get(&key).cloned();

        if let Some(record) = &existing {
            if record.weight > 0 && record.option != option {
                return Err(GovernanceError::SideSwitch {
                    proposal_id: id,
                    voter: voter.clone(),
                    existing: record.option,
                    attempted: option,
                });
            }
        }

        let committed = existing.as_ref().map_or(0, |r| r.weight);
        let available = self
            .collab
            .weights
            .weight_of(voter, p.snapshot)
            .saturating_sub(committed);
        if available == 0 {
            return Err(GovernanceError::NoVotingWeight {
                proposal_id: id,
                voter: voter.clone(),
            });
        }
        let weight = match amount {
            0 => available,
            requested if requested > available => {
                return Err(GovernanceError::InsufficientWeight {
                    proposal_id: id,
                    voter: voter.clone(),
                    requested,
                    available,
                });
            }
            requested => requested,
        };

        let total = p
            .votes(option)
            .checked_add(weight)
            .ok_or(GovernanceError::Overflow("vote total"))?;
        *p.votes_mut(option) = total;

        let pre_boosted = p.state.is_stakeable() && option.is_binding();
        let mut deposit = 0;
        if pre_boosted {
            match option {
                VoteOption::Yes => p.pre_boosted_yes += weight,
                _ => p.pre_boosted_no += weight,
            }
            let owed = percent_of(weight, params.voters_reputation_loss_ratio);
            if owed > 0 {
                deposit = self.collab.reputation.burn(voter, owed)?;
                self.undo.push(Undo::Burned {
                    from: voter.clone(),
                    amount: deposit,
                });
            }
            match option {
                VoteOption::Yes => p.pre_boosted_deposit_yes += deposit,
                _ => p.pre_boosted_deposit_no += deposit,
            }
        }

        if option.is_binding() {
            let leader = if p.yes_votes > p.no_votes {
                VoteOption::Yes
            } else {
                VoteOption::No
            };
            if leader != p.winning_vote {
                let late = p.boosted_at.is_some_and(|at| {
                    let window_start = p
                        .current_boosted_period_limit
                        .saturating_sub(params.quiet_ending_period);
                    at.has_expired(window_start, now)
                });
                if p.state == ProposalState::Boosted && late && !p.quiet_ending_extended {
                    p.state = ProposalState::QuietEndingPeriod;
                    p.current_boosted_period_limit = p
                        .current_boosted_period_limit
                        .saturating_add(params.quiet_ending_period);
                    p.quiet_ending_extended = true;
                    tracing::info!(%id, %leader, "leader flipped late, quiet ending started");
                    self.emit(GovernanceEvent::StateChange {
                        proposal_id: id,
                        from: ProposalState::Boosted,
                        to: ProposalState::QuietEndingPeriod,
                    });
                }
                p.winning_vote = leader;
            }
        }

        let scheme_id = p.scheme_id;
        *self.proposal_mut(&id)? = p;
        self.undo.push(Undo::Vote {
            key: key.clone(),
            previous: existing,
        });
        let record = self.state.votes.entry(key).or_insert(VoteRecord {
            option,
            weight: 0,
            pre_boosted_weight: 0,
            deposit: 0,
            redeemed: false,
        });
        record.option = option;
        record.weight += weight;
        if pre_boosted {
            record.pre_boosted_weight += weight;
            record.deposit += deposit;
        }

        tracing::debug!(%id, %voter, %option, weight, deposit, "vote recorded");
        self.emit(GovernanceEvent::Vote {
            proposal_id: id,
            scheme_id,
            voter: voter.clone(),
            option,
            weight,
        });
        self.advance(id)
    }
}
