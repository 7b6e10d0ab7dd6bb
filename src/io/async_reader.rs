//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading of operation records for the async strategy.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - the csv_format module for record conversion
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Operations
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

use crate::io::csv_format::{at_line, convert_csv_record, CsvRecord};
use crate::types::{LedgerError, Operation};

/// Asynchronous CSV reader
///
/// Keeps memory bounded by the batch size regardless of file size.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
            skipped: 0,
        }
    }

    /// Number of rows skipped so far because they could not be parsed
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Read a batch of operations
    ///
    /// Reads up to `batch_size` valid records. Invalid rows are logged and
    /// skipped and do not count towards the batch size. Returns an empty
    /// vector at end of input.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::IoError` if the underlying reader fails. Any
    /// operations already read into the batch are dropped.
    pub async fn read_batch(
        &mut self,
        batch_size: usize,
    ) -> Result<Vec<Operation>, LedgerError> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            let result = match records.next().await {
                Some(Ok(csv_record)) => convert_csv_record(csv_record),
                Some(Err(e)) => match e.kind() {
                    csv_async::ErrorKind::Io(io_err) => {
                        return Err(LedgerError::IoError {
                            message: format!("Failed to read input: {}", io_err),
                        })
                    }
                    _ => Err(LedgerError::parse_error(None, e.to_string())),
                },
                None => break,
            };
            self.line_num += 1;

            match result {
                Ok(operation) => batch.push(operation),
                Err(e) => {
                    self.skipped += 1;
                    warn!(error = %at_line(e, self.line_num), "Skipping unparseable record");
                }
            }
        }

        Ok(batch)
    }
}
