//! Core traits for balance storage and history logging
//!
//! The ledger is generic over these traits so that the in-memory stores can be
//! replaced (for example by an instrumented store in tests) without touching
//! the concurrency discipline in [`crate::core::ledger`].
//!
//! Neither trait promises atomicity across calls. Serializing a read with the
//! write that follows it is the ledger's job, not the store's.

use chrono::{DateTime, Utc};

use crate::types::{Balance, Points, Transaction, TransactionKind, UserId};

/// Key-value table of current balances
pub trait BalanceStore: Send + Sync {
    /// Current balance of `user`, or the zero-value balance if none was written
    fn read(&self, user: UserId) -> Balance;

    /// Replace the balance of `user` unconditionally and return the new record
    fn write(&self, user: UserId, point: Points, updated_at: DateTime<Utc>) -> Balance;

    /// Copy of every stored balance, in no particular order
    fn snapshot(&self) -> Vec<Balance>;
}

/// Append-only log of transaction records
pub trait HistoryLog: Send + Sync {
    /// Assign the next global history id, store the record and return it
    fn append(
        &self,
        user: UserId,
        amount: Points,
        kind: TransactionKind,
        balance_after: Points,
        occurred_at: DateTime<Utc>,
    ) -> Transaction;

    /// Every record of `user`, in ascending history id order
    fn read_all(&self, user: UserId) -> Vec<Transaction>;

    /// Every record of every user, in ascending history id order
    fn snapshot(&self) -> Vec<Transaction>;
}
