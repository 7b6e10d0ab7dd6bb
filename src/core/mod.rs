//! Core business logic module
//!
//! This module contains the ledger and its collaborators:
//! - `traits` - Store abstractions the ledger is generic over
//! - `balance_store` - In-memory table of current balances
//! - `history_log` - In-memory append-only transaction log
//! - `guard` - Per-user mutual exclusion for mutating operations
//! - `clock` - Time sources
//! - `ledger` - Charge/use/balance/history orchestration
//! - `batch_processor` - Concurrent application of operation batches

pub mod balance_store;
pub mod batch_processor;
pub mod clock;
pub mod guard;
pub mod history_log;
pub mod ledger;
pub mod traits;

pub use balance_store::InMemoryBalanceStore;
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use clock::{Clock, FixedClock, SystemClock};
pub use guard::{LockingMode, UserGuard};
pub use history_log::InMemoryHistoryLog;
pub use ledger::PointLedger;
pub use traits::{BalanceStore, HistoryLog};
