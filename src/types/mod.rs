//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `balance`: Balance record
//! - `transaction`: Identifiers, history records and input operations
//! - `error`: Error types for the point ledger
//! - `timestamp`: Output format of timestamps

pub mod balance;
pub mod error;
pub mod timestamp;
pub mod transaction;

pub use balance::Balance;
pub use error::LedgerError;
pub use transaction::{HistoryId, Operation, Points, Transaction, TransactionKind, UserId};
