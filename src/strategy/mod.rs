//! Processing strategy module for batch ledger runs
//!
//! This module defines the Strategy pattern for complete processing pipelines:
//! reading operations from CSV, applying them to a fresh [`PointLedger`] and
//! writing the resulting balances or history. Implementations (sequential,
//! async batch) are selected at runtime.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cli::{OutputKind, StrategyType};
use crate::core::{Clock, LockingMode, PointLedger, SystemClock};
use crate::io::{write_balances_csv, write_history_csv};
use crate::types::{Balance, LedgerError, Operation};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete ledger runs
pub trait ProcessingStrategy: Send + Sync {
    /// Apply every operation in `input_path` and write the report to `output`
    ///
    /// Rejected operations and unparseable rows are logged and skipped; they
    /// never fail the run.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file cannot be opened (file not found, permission denied)
    /// - The async runtime cannot be created
    /// - Output cannot be written
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError>;
}

/// Ledger construction and report settings shared by all strategies
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// How mutating operations are serialized
    pub locking: LockingMode,

    /// What the run writes to its output
    pub output: OutputKind,

    /// Time source for balance and history timestamps
    pub clock: Arc<dyn Clock>,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            locking: LockingMode::PerUser,
            output: OutputKind::Balances,
            clock: Arc::new(SystemClock),
        }
    }
}

impl LedgerSettings {
    pub fn build_ledger(&self) -> PointLedger {
        PointLedger::in_memory(self.locking, Arc::clone(&self.clock))
    }

    /// Write the final ledger state in the configured output format
    pub fn write_report(
        &self,
        ledger: &PointLedger,
        output: &mut dyn Write,
    ) -> Result<(), LedgerError> {
        match self.output {
            OutputKind::Balances => write_balances_csv(&ledger.balances(), output),
            OutputKind::History => write_history_csv(&ledger.all_history(), output),
        }
    }
}

/// Counters for a single run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
    pub skipped: usize,
}

impl RunSummary {
    /// Count the outcome of one operation, logging rejections
    pub fn record(&mut self, operation: &Operation, result: &Result<Balance, LedgerError>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(e) => {
                self.rejected += 1;
                warn!(
                    user = operation.user,
                    kind = %operation.kind,
                    amount = operation.amount,
                    code = e.code(),
                    error = %e,
                    "Rejected operation"
                );
            }
        }
    }

    pub fn log(&self, strategy: &str) {
        info!(
            strategy,
            applied = self.applied,
            rejected = self.rejected,
            skipped = self.skipped,
            "Run finished"
        );
    }
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - Sequential (Sync) or concurrent batches (Async)
/// * `config` - Batch configuration for Async (ignored for Sync)
/// * `settings` - Ledger and output settings
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    settings: LedgerSettings,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(settings)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, settings))
        }
    }
}
