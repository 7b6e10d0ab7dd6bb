//! In-memory history log
//!
//! This module provides the `InMemoryHistoryLog` struct, an append-only log of
//! transaction records grouped by user.
//!
//! # Design
//!
//! Records live in a `DashMap<UserId, Vec<Transaction>>`. History ids come from
//! one `AtomicU64` shared by all users, the only cross-user mutable state in
//! the ledger. The id is taken while the user's entry is held, so within a
//! user the vector is always in ascending id order, whatever the caller does.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::traits::HistoryLog;
use crate::types::{HistoryId, Points, Transaction, TransactionKind, UserId};

/// Append-only transaction log backed by a concurrent hash map
#[derive(Debug)]
pub struct InMemoryHistoryLog {
    /// Records per user, in insertion (= id) order
    entries: DashMap<UserId, Vec<Transaction>>,

    /// Next history id to hand out; ids start at 1
    next_id: AtomicU64,
}

impl InMemoryHistoryLog {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> HistoryId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryHistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLog for InMemoryHistoryLog {
    fn append(
        &self,
        user: UserId,
        amount: Points,
        kind: TransactionKind,
        balance_after: Points,
        occurred_at: DateTime<Utc>,
    ) -> Transaction {
        let mut records = self.entries.entry(user).or_default();
        let transaction = Transaction {
            id: self.next_id(),
            user,
            kind,
            amount,
            balance_after,
            occurred_at,
        };
        records.push(transaction.clone());
        transaction
    }

    fn read_all(&self, user: UserId) -> Vec<Transaction> {
        self.entries
            .get(&user)
            .map(|records| records.value().clone())
            .unwrap_or_default()
    }

    fn snapshot(&self) -> Vec<Transaction> {
        let mut all: Vec<Transaction> = self
            .entries
            .iter()
            .flat_map(|records| records.value().clone())
            .collect();
        all.sort_by_key(|transaction| transaction.id);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test]
    fn test_append_assigns_increasing_ids_across_users() {
        let log = InMemoryHistoryLog::new();

        let first = log.append(1, 1000, TransactionKind::Charge, 1000, now());
        let second = log.append(2, 500, TransactionKind::Charge, 500, now());
        let third = log.append(1, 300, TransactionKind::Use, 700, now());

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_read_all_returns_records_in_insertion_order() {
        let log = InMemoryHistoryLog::new();

        log.append(1, 5000, TransactionKind::Charge, 5000, now());
        log.append(2, 100, TransactionKind::Charge, 100, now());
        log.append(1, 3000, TransactionKind::Use, 2000, now());

        let history = log.read_all(1);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, TransactionKind::Charge);
        assert_eq!(history[0].amount, 5000);
        assert_eq!(history[1].kind, TransactionKind::Use);
        assert_eq!(history[1].amount, 3000);
        assert_eq!(history[1].balance_after, 2000);
        assert!(history[0].id < history[1].id);
    }

    #[test]
    fn test_read_all_unknown_user_is_empty() {
        let log = InMemoryHistoryLog::new();
        assert!(log.read_all(99).is_empty());
    }

    #[test]
    fn test_snapshot_is_sorted_by_id() {
        let log = InMemoryHistoryLog::new();

        for user in [3u64, 1, 2, 1, 3] {
            log.append(user, 10, TransactionKind::Charge, 10, now());
        }

        let ids: Vec<_> = log.snapshot().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_concurrent_appends_never_reuse_ids() {
        let log = Arc::new(InMemoryHistoryLog::new());

        let mut handles = vec![];
        for user in 0u64..8 {
            let log_clone = Arc::clone(&log);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    log_clone.append(user % 3, 1, TransactionKind::Charge, 1, now());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let all = log.snapshot();
        assert_eq!(all.len(), 800);
        for pair in all.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }

        for user in 0u64..3 {
            let history = log.read_all(user);
            for pair in history.windows(2) {
                assert!(pair[0].id < pair[1].id);
            }
        }
    }
}
