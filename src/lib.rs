//! Point Ledger Library
//! # Overview
//!
//! This library keeps a per-user point balance and an append-only history of
//! every balance change, and stays correct when many threads charge and use
//! points for the same user at once.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Balance, Transaction, Operation, errors)
//! - [`core`] - Business logic components:
//!   - [`core::ledger`] - Charge/use/balance/history orchestration
//!   - [`core::guard`] - Per-user mutual exclusion
//!   - [`core::balance_store`] / [`core::history_log`] - In-memory stores
//!   - [`core::batch_processor`] - Concurrent batch application
//! - [`io`] - CSV input and output
//! - [`strategy`] - Sequential and async batch runs
//! - [`cli`] - CLI arguments and log setup
//!
//! # Operations
//!
//! - **Charge**: add a positive amount to a balance
//! - **Use**: spend a positive amount, rejected if the balance does not cover it
//! - **Balance**: current balance; zero for unknown users
//! - **History**: every charge and use of a user, oldest first
//!
//! # Guarantees
//!
//! For a single user, concurrent charges and uses produce the same balance and
//! history as some sequential order of those calls: no lost updates and no
//! negative balance. Different users never wait on each other.
//!
//! ```
//! use point_ledger::{LedgerError, PointLedger};
//!
//! let ledger = PointLedger::new();
//! ledger.charge(1, 5000).unwrap();
//! ledger.use_points(1, 3000).unwrap();
//!
//! assert_eq!(ledger.balance(1).point, 2000);
//! assert!(matches!(
//!     ledger.use_points(1, 6000),
//!     Err(LedgerError::InsufficientBalance { .. })
//! ));
//! ```

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use self::core::{LockingMode, PointLedger};
pub use io::{write_balances_csv, write_history_csv};
pub use types::{
    Balance, HistoryId, LedgerError, Operation, Points, Transaction, TransactionKind, UserId,
};
