//! Point ledger orchestration
//!
//! This module provides the `PointLedger` struct, which applies charges and
//! uses against a [`BalanceStore`] and a [`HistoryLog`] under a [`UserGuard`].
//!
//! # Architecture
//!
//! ```text
//! PointLedger
//!     ├── Arc<B: BalanceStore>   (current balance per user)
//!     ├── Arc<H: HistoryLog>     (append-only transaction records)
//!     ├── Arc<UserGuard>         (per-user mutual exclusion)
//!     └── Arc<dyn Clock>         (timestamps)
//! ```
//!
//! # Mutating Operations
//!
//! `charge` and `use_points` validate the amount first, then, with the user's
//! lock held: read the balance, check it, write the new balance and append a
//! history record. Every rejection happens before the write, so a failed call
//! never leaves a trace in either store.
//!
//! # Read Operations
//!
//! `balance` and `history` bypass the guard. A read that races a charge may see
//! the balance from before or after it, but always one that was valid.

use std::sync::Arc;
use tracing::debug;

use crate::core::balance_store::InMemoryBalanceStore;
use crate::core::clock::{Clock, SystemClock};
use crate::core::guard::{LockingMode, UserGuard};
use crate::core::history_log::InMemoryHistoryLog;
use crate::core::traits::{BalanceStore, HistoryLog};
use crate::types::{
    Balance, LedgerError, Operation, Points, Transaction, TransactionKind, UserId,
};

/// Concurrent point ledger
///
/// Cloning is cheap and every clone shares the same stores and guard, so a
/// ledger can be handed to as many threads or tasks as needed.
#[derive(Debug)]
pub struct PointLedger<B = InMemoryBalanceStore, H = InMemoryHistoryLog> {
    balances: Arc<B>,
    history: Arc<H>,
    guard: Arc<UserGuard>,
    clock: Arc<dyn Clock>,
}

impl<B, H> Clone for PointLedger<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: Arc::clone(&self.balances),
            history: Arc::clone(&self.history),
            guard: Arc::clone(&self.guard),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl PointLedger {
    /// Create an in-memory ledger with per-user locking and the system clock
    pub fn new() -> Self {
        Self::in_memory(LockingMode::PerUser, Arc::new(SystemClock))
    }

    /// Create an in-memory ledger with the given locking mode and clock
    pub fn in_memory(mode: LockingMode, clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(
            Arc::new(InMemoryBalanceStore::new()),
            Arc::new(InMemoryHistoryLog::new()),
            Arc::new(UserGuard::new(mode)),
            clock,
        )
    }
}

impl Default for PointLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: BalanceStore, H: HistoryLog> PointLedger<B, H> {
    /// Assemble a ledger from its collaborators
    pub fn with_parts(
        balances: Arc<B>,
        history: Arc<H>,
        guard: Arc<UserGuard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            balances,
            history,
            guard,
            clock,
        }
    }

    pub fn locking_mode(&self) -> LockingMode {
        self.guard.mode()
    }

    /// Add points to a user's balance
    ///
    /// # Arguments
    ///
    /// * `user` - The user to charge
    /// * `amount` - Points to add; must be positive
    ///
    /// # Returns
    ///
    /// * `Ok(Balance)` - The balance after the charge
    /// * `Err(LedgerError::InvalidAmount)` - If `amount <= 0`
    /// * `Err(LedgerError::BalanceOverflow)` - If the new balance would not fit
    pub fn charge(&self, user: UserId, amount: i64) -> Result<Balance, LedgerError> {
        let amount = validate_amount(user, amount)?;

        self.guard.with_lock(user, || {
            let current = self.balances.read(user);
            let point = current
                .point
                .checked_add(amount)
                .ok_or_else(|| LedgerError::balance_overflow(user, current.point, amount))?;

            Ok(self.commit(user, amount, TransactionKind::Charge, point))
        })
    }

    /// Spend points from a user's balance
    ///
    /// The balance is checked inside the user's critical section against the
    /// value just read from the store, never against an earlier snapshot.
    ///
    /// # Arguments
    ///
    /// * `user` - The user spending points
    /// * `amount` - Points to spend; must be positive
    ///
    /// # Returns
    ///
    /// * `Ok(Balance)` - The balance after the use
    /// * `Err(LedgerError::InvalidAmount)` - If `amount <= 0`
    /// * `Err(LedgerError::InsufficientBalance)` - If `amount` exceeds the balance
    pub fn use_points(&self, user: UserId, amount: i64) -> Result<Balance, LedgerError> {
        let amount = validate_amount(user, amount)?;

        self.guard.with_lock(user, || {
            let current = self.balances.read(user);
            let point = current
                .point
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::insufficient_balance(user, current.point, amount))?;

            Ok(self.commit(user, amount, TransactionKind::Use, point))
        })
    }

    /// Current balance of a user; zero for users never seen
    pub fn balance(&self, user: UserId) -> Balance {
        self.balances.read(user)
    }

    /// History of a user in ascending history id order; empty for users never seen
    pub fn history(&self, user: UserId) -> Vec<Transaction> {
        let mut records = self.history.read_all(user);
        records.sort_by_key(|record| record.id);
        records
    }

    /// Every stored balance, sorted by user
    pub fn balances(&self) -> Vec<Balance> {
        let mut balances = self.balances.snapshot();
        balances.sort_by_key(|balance| balance.user);
        balances
    }

    /// Every history record of every user, sorted by history id
    pub fn all_history(&self) -> Vec<Transaction> {
        self.history.snapshot()
    }

    /// Dispatch a parsed operation to `charge` or `use_points`
    pub fn apply(&self, operation: &Operation) -> Result<Balance, LedgerError> {
        match operation.kind {
            TransactionKind::Charge => self.charge(operation.user, operation.amount),
            TransactionKind::Use => self.use_points(operation.user, operation.amount),
        }
    }

    /// Write the new balance and record the transaction
    ///
    /// Must only be called with the user's guard held.
    fn commit(
        &self,
        user: UserId,
        amount: Points,
        kind: TransactionKind,
        point: Points,
    ) -> Balance {
        let now = self.clock.now();
        let balance = self.balances.write(user, point, now);
        let record = self.history.append(user, amount, kind, point, now);

        debug!(
            user,
            kind = %kind,
            amount,
            balance = point,
            history_id = record.id,
            "Applied transaction"
        );

        balance
    }
}

fn validate_amount(user: UserId, amount: i64) -> Result<Points, LedgerError> {
    if amount <= 0 {
        return Err(LedgerError::invalid_amount(user, amount));
    }
    Ok(amount.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use chrono::{DateTime, Utc};
    use rstest::rstest;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    fn ledger() -> PointLedger {
        PointLedger::in_memory(LockingMode::PerUser, Arc::new(FixedClock::at_millis(1_000)))
    }

    /// Balance store that sleeps between observing and returning a balance
    ///
    /// Widens the read-then-write window so that a missing guard shows up as
    /// lost updates.
    #[derive(Debug, Default)]
    struct SlowBalanceStore {
        inner: InMemoryBalanceStore,
    }

    impl BalanceStore for SlowBalanceStore {
        fn read(&self, user: UserId) -> Balance {
            let balance = self.inner.read(user);
            thread::sleep(Duration::from_millis(2));
            balance
        }

        fn write(&self, user: UserId, point: Points, updated_at: DateTime<Utc>) -> Balance {
            self.inner.write(user, point, updated_at)
        }

        fn snapshot(&self) -> Vec<Balance> {
            self.inner.snapshot()
        }
    }

    fn slow_ledger(mode: LockingMode) -> PointLedger<SlowBalanceStore, InMemoryHistoryLog> {
        PointLedger::with_parts(
            Arc::new(SlowBalanceStore::default()),
            Arc::new(InMemoryHistoryLog::new()),
            Arc::new(UserGuard::new(mode)),
            Arc::new(FixedClock::epoch()),
        )
    }

    #[test]
    fn test_charge_updates_balance() {
        let ledger = ledger();

        let balance = ledger.charge(1, 5000).unwrap();

        assert_eq!(balance.user, 1);
        assert_eq!(balance.point, 5000);
        assert_eq!(balance.updated_at.timestamp_millis(), 1_000);
        assert_eq!(ledger.balance(1).point, 5000);
    }

    #[test]
    fn test_charge_then_use() {
        let ledger = ledger();

        ledger.charge(1, 5000).unwrap();
        let balance = ledger.use_points(1, 3000).unwrap();

        assert_eq!(balance.point, 2000);
        assert_eq!(ledger.balance(1).point, 2000);

        let history = ledger.history(1);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, TransactionKind::Charge);
        assert_eq!(history[0].amount, 5000);
        assert_eq!(history[0].balance_after, 5000);
        assert_eq!(history[1].kind, TransactionKind::Use);
        assert_eq!(history[1].amount, 3000);
        assert_eq!(history[1].balance_after, 2000);
    }

    #[test]
    fn test_use_more_than_balance_is_rejected_without_side_effect() {
        let ledger = ledger();
        ledger.charge(1, 5000).unwrap();

        let result = ledger.use_points(1, 6000);

        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                user: 1,
                available: 5000,
                requested: 6000
            })
        );
        assert_eq!(ledger.balance(1).point, 5000);
        assert_eq!(ledger.history(1).len(), 1);
    }

    #[test]
    fn test_use_exact_balance_reaches_zero() {
        let ledger = ledger();
        ledger.charge(1, 500).unwrap();

        assert_eq!(ledger.use_points(1, 500).unwrap().point, 0);
        assert!(matches!(
            ledger.use_points(1, 1),
            Err(LedgerError::InsufficientBalance { available: 0, .. })
        ));
    }

    #[test]
    fn test_use_on_unknown_user_is_rejected() {
        let ledger = ledger();

        assert!(matches!(
            ledger.use_points(42, 1),
            Err(LedgerError::InsufficientBalance { user: 42, available: 0, requested: 1 })
        ));
        assert!(ledger.history(42).is_empty());
        assert!(ledger.balances().is_empty());
    }

    #[rstest]
    #[case::negative_charge(TransactionKind::Charge, -1000)]
    #[case::zero_charge(TransactionKind::Charge, 0)]
    #[case::negative_use(TransactionKind::Use, -1)]
    #[case::zero_use(TransactionKind::Use, 0)]
    #[case::min_charge(TransactionKind::Charge, i64::MIN)]
    fn test_non_positive_amount_is_rejected_without_side_effect(
        #[case] kind: TransactionKind,
        #[case] amount: i64,
    ) {
        let ledger = ledger();
        ledger.charge(1, 100).unwrap();

        let result = ledger.apply(&Operation { kind, user: 1, amount });

        assert_eq!(result, Err(LedgerError::InvalidAmount { user: 1, amount }));
        assert_eq!(ledger.balance(1).point, 100);
        assert_eq!(ledger.history(1).len(), 1);
    }

    #[test]
    fn test_invalid_charge_on_fresh_user_leaves_zero() {
        let ledger = ledger();

        assert!(ledger.charge(1, -1000).is_err());
        assert_eq!(ledger.balance(1).point, 0);
        assert!(ledger.history(1).is_empty());
    }

    #[test]
    fn test_charge_overflow_is_rejected_without_side_effect() {
        let ledger = ledger();
        ledger.charge(1, i64::MAX).unwrap();
        ledger.charge(1, i64::MAX).unwrap();
        let before = ledger.balance(1);

        let result = ledger.charge(1, 2);

        assert!(matches!(result, Err(LedgerError::BalanceOverflow { user: 1, .. })));
        assert_eq!(ledger.balance(1), before);
        assert_eq!(ledger.history(1).len(), 2);
    }

    #[test]
    fn test_unknown_user_has_zero_balance_and_empty_history() {
        let ledger = ledger();

        let balance = ledger.balance(99);

        assert_eq!(balance.user, 99);
        assert_eq!(balance.point, 0);
        assert!(ledger.history(99).is_empty());
    }

    #[test]
    fn test_history_ids_are_global() {
        let ledger = ledger();

        ledger.charge(1, 10).unwrap();
        ledger.charge(2, 20).unwrap();
        ledger.use_points(1, 5).unwrap();

        let ids: Vec<_> = ledger.history(1).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(ledger.history(2)[0].id, 2);

        let all: Vec<_> = ledger.all_history().iter().map(|t| t.id).collect();
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[test]
    fn test_balances_are_sorted_by_user() {
        let ledger = ledger();

        ledger.charge(3, 30).unwrap();
        ledger.charge(1, 10).unwrap();
        ledger.charge(2, 20).unwrap();

        let users: Vec<_> = ledger.balances().iter().map(|b| b.user).collect();
        assert_eq!(users, vec![1, 2, 3]);
    }

    #[test]
    fn test_clones_share_state() {
        let ledger = ledger();
        let clone = ledger.clone();

        clone.charge(1, 700).unwrap();

        assert_eq!(ledger.balance(1).point, 700);
    }

    #[rstest]
    #[case::per_user(LockingMode::PerUser)]
    #[case::global(LockingMode::Global)]
    fn test_slow_store_concurrent_charges_lose_nothing(#[case] mode: LockingMode) {
        let ledger = slow_ledger(mode);
        let barrier = Arc::new(Barrier::new(10));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let ledger = ledger.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ledger.charge(1, 1000).unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.locking_mode(), mode);
        assert_eq!(ledger.balance(1).point, 10_000);
        assert_eq!(ledger.history(1).len(), 10);
    }

    #[test]
    fn test_slow_store_concurrent_uses_never_overdraw() {
        let ledger = slow_ledger(LockingMode::PerUser);
        ledger.charge(1, 2000).unwrap();
        let barrier = Arc::new(Barrier::new(10));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let ledger = ledger.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    ledger.use_points(1, 500)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let succeeded = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(succeeded, 4);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance(1).point, 0);
        assert_eq!(ledger.history(1).len(), 5);
    }
}
