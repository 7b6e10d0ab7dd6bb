//! Balance-related types for the point ledger
//!
//! This module defines the Balance record, the per-user point balance that the
//! ledger reads and replaces wholesale on every charge or use.

use super::transaction::{Points, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point balance of a single user
///
/// Balances are immutable values: the store replaces the whole record on every
/// write and callers always receive a copy, never a reference into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    /// The user this balance belongs to
    pub user: UserId,

    /// Current point balance
    ///
    /// Unsigned, so a negative balance cannot be represented.
    pub point: Points,

    /// When the balance was last written
    ///
    /// A balance that has never been written reports the Unix epoch.
    #[serde(serialize_with = "super::timestamp::serialize")]
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// Create the zero-value balance for a user that has never been written
    ///
    /// # Arguments
    ///
    /// * `user` - The user ID for this balance
    ///
    /// # Returns
    ///
    /// A Balance with:
    /// - point = 0
    /// - updated_at = 1970-01-01T00:00:00Z
    pub fn empty(user: UserId) -> Self {
        Balance {
            user,
            point: 0,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn new(user: UserId, point: Points, updated_at: DateTime<Utc>) -> Self {
        Balance {
            user,
            point,
            updated_at,
        }
    }
}
