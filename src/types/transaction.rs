//! Transaction-related types for the point ledger
//!
//! This module defines the identifiers, the history record written for every
//! successful charge or use, and the operation record read from CSV input.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// User identifier
pub type UserId = u64;

/// History record identifier
///
/// Assigned from a single counter shared by all users, so ids are unique and
/// strictly increasing across the whole ledger.
pub type HistoryId = u64;

/// Stored point amount
///
/// Requested amounts arrive as `i64` so that zero and negative requests can be
/// represented and rejected; once validated they become `Points`.
pub type Points = u64;

/// Kinds of balance change recorded in the history log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Points added to the balance
    Charge,

    /// Points spent from the balance
    ///
    /// Requires the balance to cover the amount.
    Use,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Charge => "CHARGE",
            TransactionKind::Use => "USE",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable history record
///
/// Created only as a side effect of a successful charge or use and never
/// mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Global, strictly increasing record identifier
    pub id: HistoryId,

    /// The user whose balance changed
    pub user: UserId,

    /// Whether points were charged or used
    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// The amount that was charged or used (always positive)
    pub amount: Points,

    /// The balance right after this transaction was applied
    pub balance_after: Points,

    /// When the transaction was applied
    #[serde(serialize_with = "super::timestamp::serialize")]
    pub occurred_at: DateTime<Utc>,
}

/// Input operation record from CSV
///
/// Represents one requested charge or use as read from the input file. The
/// amount is signed and unvalidated; the ledger rejects non-positive amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Charge or use
    pub kind: TransactionKind,

    /// The user the operation applies to
    pub user: UserId,

    /// Requested amount, validated by the ledger
    pub amount: i64,
}

impl Operation {
    pub fn charge(user: UserId, amount: i64) -> Self {
        Operation {
            kind: TransactionKind::Charge,
            user,
            amount,
        }
    }

    pub fn use_points(user: UserId, amount: i64) -> Self {
        Operation {
            kind: TransactionKind::Use,
            user,
            amount,
        }
    }
}
