//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. Operations are streamed from the SyncReader and
//! applied to the ledger one at a time, in file order, so the result is the
//! reference sequential execution every concurrent run must agree with.

use std::io::Write;
use std::path::Path;
use tracing::warn;

use crate::io::sync_reader::SyncReader;
use crate::strategy::{LedgerSettings, ProcessingStrategy, RunSummary};
use crate::types::LedgerError;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use point_ledger::strategy::{LedgerSettings, ProcessingStrategy, SyncProcessingStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncProcessingStrategy::new(LedgerSettings::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("operations.csv"), &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    settings: LedgerSettings,
}

impl SyncProcessingStrategy {
    pub fn new(settings: LedgerSettings) -> Self {
        Self { settings }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let ledger = self.settings.build_ledger();
        let reader = SyncReader::new(input_path)?;
        let mut summary = RunSummary::default();

        for result in reader {
            match result {
                Ok(operation) => {
                    let outcome = ledger.apply(&operation);
                    summary.record(&operation, &outcome);
                }
                Err(e @ LedgerError::IoError { .. }) => return Err(e),
                Err(e) => {
                    summary.skipped += 1;
                    warn!(error = %e, "Skipping unparseable record");
                }
            }
        }

        summary.log("sync");
        self.settings.write_report(&ledger, output)
    }
}
