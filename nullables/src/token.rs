//! Nullable fungible token: in-memory balances with an engine escrow.

use hive_types::{Address, FungibleToken, TokenError};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    balances: HashMap<Address, u128>,
    escrow: u128,
    fail_next: Option<String>,
}

/// A token whose `lock`/`release` move value between holders and a single
/// escrow account owned by the engine.
pub struct NullToken {
    inner: Mutex<Inner>,
}

impl NullToken {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_balances(balances: &[(Address, u128)]) -> Self {
        let token = Self::new();
        for (owner, amount) in balances {
            token.mint(owner, *amount);
        }
        token
    }

    pub fn mint(&self, owner: &Address, amount: u128) {
        *self
            .inner
            .lock()
            .unwrap()
            .balances
            .entry(owner.clone())
            .or_default() += amount;
    }

    /// Total value currently held in engine escrow.
    pub fn escrow(&self) -> u128 {
        self.inner.lock().unwrap().escrow
    }

    /// Make the next `lock` or `release` fail with the given reason.
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.inner.lock().unwrap().fail_next = Some(reason.into());
    }
}

impl Default for NullToken {
    fn default() -> Self {
        Self::new()
    }
}

impl FungibleToken for NullToken {
    fn balance_of(&self, owner: &Address) -> u128 {
        self.inner
            .lock()
            .unwrap()
            .balances
            .get(owner)
            .copied()
            .unwrap_or(0)
    }

    fn lock(&self, owner: &Address, amount: u128) -> Result<(), TokenError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = inner.fail_next.take() {
            return Err(TokenError::Rejected(reason));
        }
        let available = inner.balances.get(owner).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                owner: owner.clone(),
                needed: amount,
                available,
            });
        }
        inner.balances.insert(owner.clone(), available - amount);
        inner.escrow += amount;
        Ok(())
    }

    fn release(&self, to: &Address, amount: u128) -> Result<(), TokenError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = inner.fail_next.take() {
            return Err(TokenError::Rejected(reason));
        }
        if inner.escrow < amount {
            return Err(TokenError::InsufficientEscrow {
                needed: amount,
                available: inner.escrow,
            });
        }
        inner.escrow -= amount;
        *inner.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }
}
