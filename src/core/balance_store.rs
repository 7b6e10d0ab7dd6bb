//! In-memory balance store
//!
//! This module provides the `InMemoryBalanceStore` struct, a `DashMap`-backed
//! table of current balances keyed by user.
//!
//! # Design
//!
//! The store behaves like a raw key-value table. `read` and `write` are each
//! atomic on their own (DashMap locks the shard for the duration of the call),
//! but nothing ties a read to a later write. Two callers that read the same
//! balance and then both write will lose one of the updates; the ledger's
//! [`UserGuard`](crate::core::guard::UserGuard) is what prevents that.
//!
//! Reads of a user that has never been written return the zero-value balance
//! without inserting anything, so lookups never take a shard write lock.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::core::traits::BalanceStore;
use crate::types::{Balance, Points, UserId};

/// Balance table backed by a concurrent hash map
#[derive(Debug, Default)]
pub struct InMemoryBalanceStore {
    /// Balance per user
    ///
    /// Values are replaced wholesale on every write.
    balances: DashMap<UserId, Balance>,
}

impl InMemoryBalanceStore {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }
}

impl BalanceStore for InMemoryBalanceStore {
    fn read(&self, user: UserId) -> Balance {
        self.balances
            .get(&user)
            .map(|entry| *entry.value())
            .unwrap_or_else(|| Balance::empty(user))
    }

    fn write(&self, user: UserId, point: Points, updated_at: DateTime<Utc>) -> Balance {
        let balance = Balance::new(user, point, updated_at);
        self.balances.insert(user, balance);
        balance
    }

    fn snapshot(&self) -> Vec<Balance> {
        self.balances.iter().map(|entry| *entry.value()).collect()
    }
}
