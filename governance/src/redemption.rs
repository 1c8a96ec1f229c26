//! Post-resolution payouts.
//!
//! Every payout is computed from the proposal's own totals and drawn from
//! the owning scheme's escrow or bounty pool, so redemptions on one scheme
//! never touch another scheme's balances. Each part is paid at most once per
//! beneficiary: a second call pays zero.

use hive_math::mul_div_floor;
use hive_types::{Address, ProposalId, VoteOption};

use crate::engine::Engine;
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::proposal::ExecutionState;

/// What one `redeem` call paid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Redemption {
    /// Reputation minted (proposer reward plus voter settlement).
    pub reputation: u128,
    /// Stake tokens released.
    pub stake: u128,
}

impl Engine {
    /// Pay `beneficiary` everything they are owed on a resolved proposal.
    /// Anyone may call on the beneficiary's behalf.
    ///
    /// The reputation part is settled before the stake part; if the stake
    /// release fails the reputation part stays paid and the stake part can
    /// be redeemed again later.
    pub fn redeem(
        &mut self,
        id: &ProposalId,
        beneficiary: &Address,
    ) -> Result<Redemption, GovernanceError> {
        let id = *id;
        self.with_guard(id, |engine| engine.internal_redeem(id, beneficiary))
    }

    fn internal_redeem(
        &mut self,
        id: ProposalId,
        beneficiary: &Address,
    ) -> Result<Redemption, GovernanceError> {
        let p = self.proposal_ref(&id)?.clone();
        if !p.state.is_terminal() {
            return Err(GovernanceError::NotTerminal {
                proposal_id: id,
                state: p.state,
            });
        }
        let params = self.params_ref(&p.params_hash)?.params.clone();
        let timed_out = p.execution_state == ExecutionState::QueueTimeOut;
        let key = (id, beneficiary.clone());
        let overflow = || GovernanceError::Overflow("redemption");

        // ── reputation ──────────────────────────────────────────────────
        let proposer_reward = if &p.proposer == beneficiary
            && !p.proposer_rewarded
            && p.winning_vote == VoteOption::Yes
            && !timed_out
        {
            params.proposing_rep_reward
        } else {
            0
        };
        let claim_proposer = &p.proposer == beneficiary && !p.proposer_rewarded;

        let vote = self.state.votes.get(&key).cloned();
        let mut voter_reward = 0;
        let claim_vote = vote
            .as_ref()
            .is_some_and(|v| !v.redeemed && v.pre_boosted_weight > 0);
        if let Some(v) = vote.as_ref().filter(|_| claim_vote) {
            if timed_out {
                voter_reward = v.deposit;
            } else if v.option == p.winning_vote {
                // Only what the losers actually had burned is shared out.
                let lost = v
                    .option
                    .opposite()
                    .map_or(0, |side| p.pre_boosted_deposits(side));
                let share = mul_div_floor(
                    v.pre_boosted_weight,
                    lost,
                    p.pre_boosted_votes(p.winning_vote),
                )
                .ok_or_else(overflow)?;
                voter_reward = v.deposit.checked_add(share).ok_or_else(overflow)?;
            }
        }

        let reputation = proposer_reward
            .checked_add(voter_reward)
            .ok_or_else(overflow)?;
        if reputation > 0 {
            self.collab.reputation.mint(beneficiary, reputation)?;
        }
        if claim_proposer {
            self.proposal_mut(&id)?.proposer_rewarded = true;
        }
        if claim_vote {
            if let Some(v) = self.state.votes.get_mut(&key) {
                v.redeemed = true;
            }
        }
        if reputation > 0 {
            tracing::debug!(%id, %beneficiary, reputation, "reputation redeemed");
            self.emit(GovernanceEvent::RedeemReputation {
                proposal_id: id,
                beneficiary: beneficiary.clone(),
                amount: reputation,
            });
        }

        // ── stake ───────────────────────────────────────────────────────
        let stake = self
            .state
            .stakes
            .get(&key)
            .filter(|s| !s.redeemed && s.amount > 0)
            .cloned();
        let mut payout = 0;
        if let Some(s) = &stake {
            if timed_out {
                payout = s.amount;
            } else if s.option == p.winning_vote {
                payout = mul_div_floor(s.amount, p.total_stakes(), p.stakes(s.option))
                    .ok_or_else(overflow)?;
            }
        }
        if payout > 0 {
            let pool = self.proposal_ref(&id)?.stake_pool_remaining;
            let escrow = self.scheme_ref(&p.scheme_id)?.escrow;
            if payout > pool || payout > escrow {
                return Err(GovernanceError::InsufficientEscrow {
                    scheme_id: p.scheme_id,
                    needed: payout,
                    available: pool.min(escrow),
                });
            }
            self.collab
                .stake_token
                .release(beneficiary, payout)
                .map_err(|source| GovernanceError::StakeTransfer {
                    proposal_id: id,
                    source,
                })?;
            self.proposal_mut(&id)?.stake_pool_remaining = pool - payout;
            self.scheme_mut(&p.scheme_id)?.escrow = escrow - payout;
            tracing::debug!(%id, %beneficiary, payout, "stake redeemed");
            self.emit(GovernanceEvent::Redeem {
                proposal_id: id,
                beneficiary: beneficiary.clone(),
                amount: payout,
            });
        }
        if stake.is_some() {
            if let Some(s) = self.state.stakes.get_mut(&key) {
                s.redeemed = true;
            }
        }

        Ok(Redemption {
            reputation,
            stake: payout,
        })
    }

    /// Pay a Yes staker of a passed proposal their share of the DAO bounty
    /// from the scheme's bounty pool. Returns the amount paid.
    pub fn redeem_dao_bounty(
        &mut self,
        id: &ProposalId,
        beneficiary: &Address,
    ) -> Result<u128, GovernanceError> {
        let id = *id;
        self.with_guard(id, |engine| engine.internal_redeem_bounty(id, beneficiary))
    }

    fn internal_redeem_bounty(
        &mut self,
        id: ProposalId,
        beneficiary: &Address,
    ) -> Result<u128, GovernanceError> {
        let p = self.proposal_ref(&id)?.clone();
        if !p.state.is_terminal() {
            return Err(GovernanceError::NotTerminal {
                proposal_id: id,
                state: p.state,
            });
        }
        let key = (id, beneficiary.clone());
        let Some(stake) = self.state.stakes.get(&key).cloned() else {
            return Ok(0);
        };
        let eligible = p.winning_vote == VoteOption::Yes
            && p.execution_state != ExecutionState::QueueTimeOut
            && stake.option == VoteOption::Yes
            && stake.amount_for_bounty > 0
            && !stake.bounty_redeemed;
        if !eligible {
            return Ok(0);
        }

        let amount = mul_div_floor(stake.amount_for_bounty, p.dao_bounty, p.yes_stakes)
            .ok_or(GovernanceError::Overflow("dao bounty share"))?
            .min(p.dao_bounty_remain);
        let pool = self.scheme_ref(&p.scheme_id)?.bounty_pool;
        if amount > pool {
            return Err(GovernanceError::InsufficientBountyPool {
                scheme_id: p.scheme_id,
                needed: amount,
                available: pool,
            });
        }
        if amount > 0 {
            self.collab
                .stake_token
                .release(beneficiary, amount)
                .map_err(|source| GovernanceError::FundsTransfer {
                    scheme_id: p.scheme_id,
                    source,
                })?;
            self.scheme_mut(&p.scheme_id)?.bounty_pool = pool - amount;
            self.proposal_mut(&id)?.dao_bounty_remain -= amount;
        }
        if let Some(s) = self.state.stakes.get_mut(&key) {
            s.bounty_redeemed = true;
        }

        tracing::debug!(%id, %beneficiary, amount, "dao bounty redeemed");
        self.emit(GovernanceEvent::RedeemDaoBounty {
            proposal_id: id,
            beneficiary: beneficiary.clone(),
            amount,
        });
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use crate::{ErrorKind, ProposalState};
    use hive_types::FungibleToken;

    #[test]
    fn live_proposals_cannot_be_redeemed() {
        let mut h = Harness::new();
        let id = h.propose();
        let err = h.engine.redeem(&id, &h.addr("alice")).unwrap_err();
        assert!(matches!(err, GovernanceError::NotTerminal { state: ProposalState::Queued, .. }));
    }

    #[test]
    fn winners_share_the_losing_deposits_once() {
        let mut h = Harness::new();
        let id = h.propose();
        h.engine
            .vote(&h.ctx("carol"), &id, VoteOption::No, 1_000)
            .unwrap();
        h.engine
            .vote(&h.ctx("alice"), &id, VoteOption::Yes, 0)
            .unwrap();
        assert_eq!(h.reputation.balance_of(&h.addr("alice")), 63_000);

        // Proposer reward 60, deposit 7000 back, 10% of carol's 1000.
        let paid = h.engine.redeem(&id, &h.addr("alice")).unwrap();
        assert_eq!(paid.reputation, 60 + 7_000 + 100);
        assert_eq!(h.reputation.balance_of(&h.addr("alice")), 70_160);

        let again = h.engine.redeem(&id, &h.addr("alice")).unwrap();
        assert_eq!(again, Redemption::default());

        let loser = h.engine.redeem(&id, &h.addr("carol")).unwrap();
        assert_eq!(loser, Redemption::default());
        assert_eq!(h.reputation.balance_of(&h.addr("carol")), 9_900);
    }

    #[test]
    fn losers_with_nothing_left_to_burn_fund_no_share() {
        let mut h = Harness::new();
        let id = h.propose();
        let carol = h.addr("carol");
        // Snapshot weight survives, live reputation is already gone.
        h.reputation.set_balance(&carol, 0);
        let supply = h.reputation.total_supply();

        h.engine.vote(&h.ctx("carol"), &id, VoteOption::No, 0).unwrap();
        let record = h.engine.vote_record(&id, &carol).unwrap();
        assert_eq!(record.pre_boosted_weight, 10_000);
        assert_eq!(record.deposit, 0);
        assert_eq!(h.engine.proposal(&id).unwrap().pre_boosted_deposit_no, 0);

        h.engine
            .vote(&h.ctx("alice"), &id, VoteOption::Yes, 0)
            .unwrap();
        assert_eq!(h.engine.proposal(&id).unwrap().pre_boosted_deposit_yes, 7_000);

        let paid = h.engine.redeem(&id, &h.addr("alice")).unwrap();
        assert_eq!(paid.reputation, 60 + 7_000);
        assert_eq!(h.reputation.balance_of(&h.addr("alice")), 70_060);
        // Only the proposer reward is new reputation.
        assert_eq!(h.reputation.total_supply(), supply + 60);
    }

    #[test]
    fn winning_stakers_take_the_pool() {
        let mut h = Harness::new();
        let id = h.propose();
        h.engine.stake(&h.ctx("dave"), &id, VoteOption::No, 40).unwrap();
        h.engine.stake(&h.ctx("erin"), &id, VoteOption::Yes, 60).unwrap();
        h.engine
            .vote(&h.ctx("alice"), &id, VoteOption::Yes, 0)
            .unwrap();

        let erin = h.engine.redeem(&id, &h.addr("erin")).unwrap();
        assert_eq!(erin.stake, 100);
        assert_eq!(h.stake_token.balance_of(&h.addr("erin")), 10_040);
        assert_eq!(h.engine.redeem(&id, &h.addr("erin")).unwrap().stake, 0);

        let dave = h.engine.redeem(&id, &h.addr("dave")).unwrap();
        assert_eq!(dave.stake, 0);
        assert_eq!(h.engine.scheme(&h.scheme_id()).unwrap().escrow, 0);
        assert_eq!(h.engine.proposal(&id).unwrap().stake_pool_remaining, 0);
    }

    #[test]
    fn queue_timeout_returns_principal_and_deposits() {
        let mut h = Harness::new();
        let id = h.propose();
        h.engine.stake(&h.ctx("dave"), &id, VoteOption::No, 40).unwrap();
        h.engine
            .vote(&h.ctx("carol"), &id, VoteOption::No, 1_000)
            .unwrap();
        h.clock.advance(60);
        h.engine.execute(&id).unwrap();

        assert_eq!(h.engine.redeem(&id, &h.addr("dave")).unwrap().stake, 40);
        assert_eq!(h.stake_token.balance_of(&h.addr("dave")), 1_000);
        assert_eq!(h.engine.redeem(&id, &h.addr("carol")).unwrap().reputation, 100);
        assert_eq!(h.reputation.balance_of(&h.addr("carol")), 10_000);
        // No proposer reward on a timed-out proposal.
        assert_eq!(h.engine.redeem(&id, &h.addr("alice")).unwrap().reputation, 0);
    }

    #[test]
    fn dao_bounty_paid_from_scheme_pool() {
        let mut h = Harness::new();
        let scheme = h.scheme_id();
        let id = h.propose();
        h.engine
            .fund_bounty_pool(&h.ctx("erin"), &scheme, 500)
            .unwrap();
        h.engine.stake(&h.ctx("erin"), &id, VoteOption::Yes, 150).unwrap();
        h.engine.stake(&h.ctx("dave"), &id, VoteOption::No, 10).unwrap();
        h.engine
            .vote(&h.ctx("alice"), &id, VoteOption::Yes, 0)
            .unwrap();

        assert_eq!(h.engine.redeem_dao_bounty(&id, &h.addr("erin")).unwrap(), 100);
        assert_eq!(h.engine.redeem_dao_bounty(&id, &h.addr("erin")).unwrap(), 0);
        assert_eq!(h.engine.redeem_dao_bounty(&id, &h.addr("dave")).unwrap(), 0);
        assert_eq!(h.engine.scheme(&scheme).unwrap().bounty_pool, 400);
        assert_eq!(h.engine.proposal(&id).unwrap().dao_bounty_remain, 0);
    }

    #[test]
    fn empty_bounty_pool_is_a_resource_error() {
        let mut h = Harness::new();
        let id = h.propose();
        h.engine.stake(&h.ctx("erin"), &id, VoteOption::Yes, 150).unwrap();
        h.engine
            .vote(&h.ctx("alice"), &id, VoteOption::Yes, 0)
            .unwrap();
        let err = h
            .engine
            .redeem_dao_bounty(&id, &h.addr("erin"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(!h.engine.stake_record(&id, &h.addr("erin")).unwrap().bounty_redeemed);
    }
}
