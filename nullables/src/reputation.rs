//! Nullable reputation: snapshot-capable in-memory balances.

use hive_types::{Address, ReputationError, ReputationLedger, SnapshotId, WeightProvider};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    balances: HashMap<Address, u128>,
    total: u128,
    snapshots: Vec<(HashMap<Address, u128>, u128)>,
}

/// Reputation balances with copy-on-snapshot history.
///
/// `snapshot()` freezes the current balances; later mints and burns only
/// change the live view.
pub struct NullReputation {
    inner: Mutex<Inner>,
}

impl NullReputation {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Build from `(account, weight)` pairs.
    pub fn with_balances(balances: &[(Address, u128)]) -> Self {
        let rep = Self::new();
        for (account, amount) in balances {
            rep.set_balance(account, *amount);
        }
        rep
    }

    /// Overwrite an account's live balance.
    pub fn set_balance(&self, account: &Address, amount: u128) {
        let mut inner = self.inner.lock().unwrap();
        let previous = inner.balances.insert(account.clone(), amount).unwrap_or(0);
        inner.total = inner.total - previous + amount;
    }

    /// Live (un-snapshotted) balance.
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.inner
            .lock()
            .unwrap()
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    /// Live total across all accounts.
    pub fn total_supply(&self) -> u128 {
        self.inner.lock().unwrap().total
    }
}

impl Default for NullReputation {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightProvider for NullReputation {
    fn snapshot(&self) -> SnapshotId {
        let mut inner = self.inner.lock().unwrap();
        let frozen = (inner.balances.clone(), inner.total);
        inner.snapshots.push(frozen);
        SnapshotId(inner.snapshots.len() as u64 - 1)
    }

    fn weight_of(&self, account: &Address, snapshot: SnapshotId) -> u128 {
        let inner = self.inner.lock().unwrap();
        inner
            .snapshots
            .get(snapshot.0 as usize)
            .and_then(|(balances, _)| balances.get(account).copied())
            .unwrap_or(0)
    }

    fn total_weight_at(&self, snapshot: SnapshotId) -> u128 {
        let inner = self.inner.lock().unwrap();
        inner
            .snapshots
            .get(snapshot.0 as usize)
            .map(|(_, total)| *total)
            .unwrap_or(0)
    }
}

impl ReputationLedger for NullReputation {
    fn mint(&self, to: &Address, amount: u128) -> Result<(), ReputationError> {
        let mut inner = self.inner.lock().unwrap();
        let total = inner
            .total
            .checked_add(amount)
            .ok_or_else(|| ReputationError::Overflow {
                account: to.clone(),
                amount,
            })?;
        inner.total = total;
        *inner.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }

    fn burn(&self, from: &Address, amount: u128) -> Result<u128, ReputationError> {
        let mut inner = self.inner.lock().unwrap();
        let balance = inner.balances.entry(from.clone()).or_default();
        let burned = amount.min(*balance);
        *balance -= burned;
        inner.total -= burned;
        Ok(burned)
    }
}
