//! Scheme records and scheme-level operations.
//!
//! Every piece of accounting the engine keeps on behalf of a scheme (boosted
//! count, stake escrow, bounty pool, refund balance) lives in its
//! [`SchemeRecord`], so one scheme's proposals can never draw on another's
//! balances even though all of them share one engine and one token escrow.

use crate::engine::{Engine, TxContext};
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;
use crate::hooks::OutcomeHook;
use hive_crypto::hash_scheme_id;
use hive_types::{Address, SchemeId};
use serde::{Deserialize, Serialize};

/// Prepaid gas-refund configuration of a scheme.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPolicy {
    /// Refund per unit of rate; zero disables refunds.
    pub unit_cost: u128,
    pub max_rate: u128,
    pub balance: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeRecord {
    pub id: SchemeId,
    pub scheme: Address,
    pub owner: Address,
    /// Proposals currently Boosted or in their quiet ending.
    pub boosted_count: u64,
    /// Running average of No-stake on proposals while boosted.
    pub average_boosted_downstake: u128,
    /// Stake held for this scheme's proposals.
    pub escrow: u128,
    /// Scheme-funded top-up for Yes stakers of passed proposals.
    pub bounty_pool: u128,
    pub refund: RefundPolicy,
}

impl SchemeRecord {
    pub fn new(scheme: Address, owner: Address) -> Self {
        Self {
            id: hash_scheme_id(&scheme, &owner),
            scheme,
            owner,
            boosted_count: 0,
            average_boosted_downstake: 0,
            escrow: 0,
            bounty_pool: 0,
            refund: RefundPolicy::default(),
        }
    }

    /// Fold a newly boosted proposal's No-stake into the average.
    pub(crate) fn enter_boost(&mut self, no_stakes: u128) -> Result<(), GovernanceError> {
        let count = u128::from(self.boosted_count);
        let sum = self
            .average_boosted_downstake
            .checked_mul(count)
            .and_then(|v| v.checked_add(no_stakes))
            .ok_or(GovernanceError::Overflow("boosted downstake average"))?;
        self.average_boosted_downstake = sum / (count + 1);
        self.boosted_count += 1;
        Ok(())
    }

    /// Remove a resolved proposal's No-stake from the average.
    pub(crate) fn exit_boost(&mut self, no_stakes: u128) {
        self.boosted_count = self.boosted_count.saturating_sub(1);
        let count = u128::from(self.boosted_count);
        if count == 0 {
            self.average_boosted_downstake = 0;
            return;
        }
        let sum = self
            .average_boosted_downstake
            .saturating_mul(count + 1)
            .saturating_sub(no_stakes);
        self.average_boosted_downstake = sum / count;
    }
}

impl Engine {
    /// Register the calling scheme under `owner`. Idempotent.
    pub fn register_scheme(&mut self, ctx: &TxContext, owner: &Address) -> SchemeId {
        self.ensure_scheme(&ctx.sender, owner)
    }

    pub(crate) fn ensure_scheme(&mut self, scheme: &Address, owner: &Address) -> SchemeId {
        let id = hash_scheme_id(scheme, owner);
        if !self.state.schemes.contains_key(&id) {
            self.state
                .schemes
                .insert(id, SchemeRecord::new(scheme.clone(), owner.clone()));
            self.state.scheme_proposals.entry(id).or_default();
            tracing::info!(%id, %scheme, %owner, "scheme registered");
            self.emit(GovernanceEvent::SchemeRegistered {
                scheme_id: id,
                scheme: scheme.clone(),
                owner: owner.clone(),
            });
        }
        id
    }

    /// Install the calling scheme's outcome hook, replacing any previous one.
    pub fn register_hook(
        &mut self,
        ctx: &TxContext,
        owner: &Address,
        hook: Box<dyn OutcomeHook>,
    ) -> Result<SchemeId, GovernanceError> {
        let id = hash_scheme_id(&ctx.sender, owner);
        if self.busy_schemes.contains(&id) {
            return Err(GovernanceError::SchemeBusy(id));
        }
        let id = self.ensure_scheme(&ctx.sender, owner);
        self.hooks.insert(id, hook);
        tracing::debug!(%id, "outcome hook registered");
        Ok(id)
    }

    /// Top up a scheme's DAO bounty pool from the caller's stake tokens.
    pub fn fund_bounty_pool(
        &mut self,
        ctx: &TxContext,
        scheme_id: &SchemeId,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        let pool = self.scheme_ref(scheme_id)?.bounty_pool;
        let new_pool = pool
            .checked_add(amount)
            .ok_or(GovernanceError::Overflow("bounty pool"))?;
        self.collab
            .stake_token
            .lock(&ctx.sender, amount)
            .map_err(|source| GovernanceError::FundsTransfer {
                scheme_id: *scheme_id,
                source,
            })?;
        self.scheme_mut(scheme_id)?.bounty_pool = new_pool;
        tracing::debug!(%scheme_id, amount, funder = %ctx.sender, "bounty pool funded");
        self.emit(GovernanceEvent::BountyPoolFunded {
            scheme_id: *scheme_id,
            amount,
        });
        Ok(())
    }
}
