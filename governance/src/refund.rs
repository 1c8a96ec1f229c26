//! Prepaid gas refunds for voters.
//!
//! A scheme configures a refund policy and deposits a balance in the native
//! currency. Each direct vote on one of its proposals is refunded
//! `unit_cost × min(rate, max_rate)` while the balance covers it. A shortfall
//! skips the refund; the vote itself never fails because of it.

use hive_types::{Address, SchemeId};

use crate::engine::{Engine, TxContext};
use crate::error::GovernanceError;
use crate::events::GovernanceEvent;

impl Engine {
    /// Configure the refund policy of `scheme` under `owner`. Only the
    /// scheme itself may call.
    pub fn set_scheme_refund(
        &mut self,
        ctx: &TxContext,
        owner: &Address,
        scheme: &Address,
        unit_cost: u128,
        max_rate: u128,
    ) -> Result<SchemeId, GovernanceError> {
        if &ctx.sender != scheme {
            return Err(GovernanceError::Unauthorized {
                expected: scheme.clone(),
                actual: ctx.sender.clone(),
            });
        }
        let id = self.ensure_scheme(scheme, owner);
        let record = self.scheme_mut(&id)?;
        record.refund.unit_cost = unit_cost;
        record.refund.max_rate = max_rate;
        tracing::info!(%id, unit_cost, max_rate, "refund policy set");
        self.emit(GovernanceEvent::RefundPolicySet {
            scheme_id: id,
            unit_cost,
            max_rate,
        });
        Ok(id)
    }

    /// Deposit native currency into the scheme's refund balance.
    pub fn fund_refund_balance(
        &mut self,
        ctx: &TxContext,
        scheme_id: &SchemeId,
        amount: u128,
    ) -> Result<(), GovernanceError> {
        let record = self.scheme_ref(scheme_id)?;
        if ctx.sender != record.scheme {
            return Err(GovernanceError::Unauthorized {
                expected: record.scheme.clone(),
                actual: ctx.sender.clone(),
            });
        }
        let balance = record
            .refund
            .balance
            .checked_add(amount)
            .ok_or(GovernanceError::Overflow("refund balance"))?;
        self.collab
            .native_token
            .lock(&ctx.sender, amount)
            .map_err(|source| GovernanceError::FundsTransfer {
                scheme_id: *scheme_id,
                source,
            })?;
        self.scheme_mut(scheme_id)?.refund.balance = balance;
        self.emit(GovernanceEvent::RefundBalanceFunded {
            scheme_id: *scheme_id,
            amount,
        });
        Ok(())
    }

    /// Return the whole unused refund balance to the scheme.
    pub fn withdraw_refund_balance(
        &mut self,
        ctx: &TxContext,
        scheme_id: &SchemeId,
    ) -> Result<u128, GovernanceError> {
        let record = self.scheme_ref(scheme_id)?;
        if ctx.sender != record.scheme {
            return Err(GovernanceError::Unauthorized {
                expected: record.scheme.clone(),
                actual: ctx.sender.clone(),
            });
        }
        let amount = record.refund.balance;
        if amount == 0 {
            return Ok(0);
        }
        self.collab
            .native_token
            .release(&ctx.sender, amount)
            .map_err(|source| GovernanceError::FundsTransfer {
                scheme_id: *scheme_id,
                source,
            })?;
        self.scheme_mut(scheme_id)?.refund.balance = 0;
        tracing::info!(%scheme_id, amount, "refund balance withdrawn");
        self.emit(GovernanceEvent::RefundBalanceWithdrawn {
            scheme_id: *scheme_id,
            amount,
        });
        Ok(amount)
    }

    /// Refund the voter's execution cost if the scheme's balance allows.
    pub(crate) fn refund_vote(&mut self, ctx: &TxContext, scheme_id: &SchemeId) {
        let Some(record) = self.state.schemes.get(scheme_id) else {
            return;
        };
        let policy = &record.refund;
        if policy.unit_cost == 0 {
            return;
        }
        let rate = ctx.gas_price.min(policy.max_rate);
        let Some(refund) = policy.unit_cost.checked_mul(rate) else {
            tracing::warn!(%scheme_id, rate, "refund amount overflows, skipped");
            return;
        };
        if refund == 0 {
            return;
        }
        if policy.balance < refund {
            tracing::warn!(
                %scheme_id,
                voter = %ctx.sender,
                refund,
                balance = policy.balance,
                "refund balance exhausted, vote not refunded"
            );
            return;
        }
        let remaining = policy.balance - refund;
        if let Err(e) = self.collab.native_token.release(&ctx.sender, refund) {
            tracing::warn!(%scheme_id, voter = %ctx.sender, error = %e, "refund transfer failed");
            return;
        }
        if let Some(record) = self.state.schemes.get_mut(scheme_id) {
            record.refund.balance = remaining;
        }
        self.emit(GovernanceEvent::GasRefunded {
            scheme_id: *scheme_id,
            beneficiary: ctx.sender.clone(),
            amount: refund,
        });
    }
}
