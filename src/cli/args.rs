use crate::core::LockingMode;
use crate::strategy::{BatchConfig, LedgerSettings};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Apply point charges and uses from a CSV file
#[derive(Parser, Debug)]
#[command(name = "point-ledger")]
#[command(about = "Apply point charges and uses from a CSV file", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for sequential or 'async' for concurrent batches"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Run every operation of a batch as its own task (async mode only)
    #[arg(
        long = "interleave",
        help = "Do not partition batches by user; per-user order within a batch is not kept"
    )]
    pub interleave: bool,

    /// How mutating operations are serialized
    #[arg(
        long = "locking",
        value_name = "MODE",
        default_value = "per-user",
        help = "Locking mode: 'per-user' or 'global'"
    )]
    pub locking: LockingType,

    /// What to write to stdout
    #[arg(
        long = "output",
        value_name = "KIND",
        default_value = "balances",
        help = "Output: final 'balances' or the full 'history'"
    )]
    pub output: OutputKind,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

/// Locking modes selectable on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum LockingType {
    /// One lock per user
    #[default]
    PerUser,
    /// One lock for the whole ledger
    Global,
}

impl From<LockingType> for LockingMode {
    fn from(locking: LockingType) -> Self {
        match locking {
            LockingType::PerUser => LockingMode::PerUser,
            LockingType::Global => LockingMode::Global,
        }
    }
}

/// Report written at the end of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputKind {
    /// Final balance per user
    #[default]
    Balances,
    /// Every history record, by history id
    History,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments, falling back to defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        let default = BatchConfig::default();
        let config = if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            default
        };
        config.interleaved(self.interleave)
    }

    /// Ledger settings with the system clock
    pub fn to_ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            locking: self.locking.into(),
            output: self.output,
            ..LedgerSettings::default()
        }
    }
}
