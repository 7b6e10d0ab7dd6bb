//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Operations are read in batches and applied by a
//! [`BatchProcessor`] running on a tokio multi-threaded runtime.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches, interleave)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (user partitioning + tokio tasks)
//!     └── PointLedger (shared by every task)
//!         ├── InMemoryBalanceStore
//!         ├── InMemoryHistoryLog
//!         └── UserGuard
//! ```
//!
//! # Ordering
//!
//! Batches are processed one after another. Within a batch, users run in
//! parallel and each user's operations keep file order, so the result equals
//! a sequential run. With `interleave` set, every operation of a batch is its
//! own task; per-user order inside a batch is then decided by the ledger's
//! guard rather than by the file.

use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::core::BatchProcessor;
use crate::io::async_reader::AsyncReader;
use crate::strategy::{LedgerSettings, ProcessingStrategy, RunSummary};
use crate::types::LedgerError;

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
    /// Run every operation as its own task instead of partitioning by user
    pub interleave: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
            interleave: false,
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "Invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "Invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
            interleave: false,
        }
    }

    pub fn interleaved(mut self, interleave: bool) -> Self {
        self.interleave = interleave;
        self
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    settings: LedgerSettings,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, settings: LedgerSettings) -> Self {
        Self { config, settings }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        info!(
            batch_size = self.config.batch_size,
            workers = self.config.max_concurrent_batches,
            interleave = self.config.interleave,
            locking = ?self.settings.locking,
            "Starting async run"
        );

        runtime.block_on(async {
            let ledger = self.settings.build_ledger();
            let processor = if self.config.interleave {
                BatchProcessor::interleaved(ledger.clone())
            } else {
                BatchProcessor::new(ledger.clone())
            };

            let file = tokio::fs::File::open(input_path).await.map_err(|e| {
                match e.kind() {
                    std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
                        path: input_path.display().to_string(),
                    },
                    _ => LedgerError::IoError {
                        message: format!("Failed to open file '{}': {}", input_path.display(), e),
                    },
                }
            })?;

            // csv-async reads through the futures AsyncRead traits
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = RunSummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await?;
                if batch.is_empty() {
                    break;
                }

                // Wait for the whole batch so a user's operations never span
                // two batches in flight.
                for processed in processor.process_batch(batch).await {
                    summary.record(&processed.operation, &processed.result);
                }
            }

            summary.skipped = reader.skipped();
            summary.log("async");
            self.settings.write_report(&ledger, output)
        })
    }
}
