//! Batch processing with user-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which applies a batch of
//! operations to a shared [`PointLedger`] from many tokio tasks at once.
//!
//! # Dispatch Modes
//!
//! - **Partitioned** (default): the batch is split by user and each user's
//!   operations run in input order inside one task. Different users run in
//!   parallel, so the output is identical to a sequential replay.
//! - **Interleaved**: every operation becomes its own task. Operations on the
//!   same user race each other and the ledger's guard decides the order. The
//!   final balance of a user is then only defined when the outcome does not
//!   depend on order (for example, a batch of charges).
//!
//! # Thread Safety
//!
//! The processor is cloneable and can be safely shared across async tasks.
//! Cloning shares the underlying ledger.

use std::collections::HashMap;
use tracing::error;

use super::ledger::PointLedger;
use super::traits::{BalanceStore, HistoryLog};
use crate::types::{Balance, LedgerError, Operation, UserId};

/// Result of applying a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was applied
    pub operation: Operation,

    /// The balance after the operation, or why it was rejected
    pub result: Result<Balance, LedgerError>,
}

/// Batch processor with user-based partitioning
#[derive(Debug)]
pub struct BatchProcessor<B, H> {
    ledger: PointLedger<B, H>,
    interleave: bool,
}

impl<B, H> Clone for BatchProcessor<B, H> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            interleave: self.interleave,
        }
    }
}

impl<B, H> BatchProcessor<B, H>
where
    B: BalanceStore + 'static,
    H: HistoryLog + 'static,
{
    /// Create a processor that partitions batches by user
    pub fn new(ledger: PointLedger<B, H>) -> Self {
        Self {
            ledger,
            interleave: false,
        }
    }

    /// Create a processor that runs every operation as its own task
    pub fn interleaved(ledger: PointLedger<B, H>) -> Self {
        Self {
            ledger,
            interleave: true,
        }
    }

    pub fn ledger(&self) -> &PointLedger<B, H> {
        &self.ledger
    }

    /// Partition a batch of operations by user
    ///
    /// # Guarantees
    ///
    /// - Each operation appears in exactly one sub-batch
    /// - Operations for each user keep their original order
    /// - Sub-batches contain only operations for a single user
    pub fn partition_by_user(&self, batch: Vec<Operation>) -> HashMap<UserId, Vec<Operation>> {
        let mut user_batches: HashMap<UserId, Vec<Operation>> = HashMap::new();

        for operation in batch {
            user_batches.entry(operation.user).or_default().push(operation);
        }

        user_batches
    }

    /// Apply a sequence of operations in order
    ///
    /// All operations are applied, even if some are rejected. Results are in
    /// the same order as the input.
    pub fn apply_in_order(&self, operations: Vec<Operation>) -> Vec<ProcessingResult> {
        operations
            .into_iter()
            .map(|operation| ProcessingResult {
                result: self.ledger.apply(&operation),
                operation,
            })
            .collect()
    }

    /// Apply a batch of operations concurrently
    ///
    /// Spawns one tokio task per user (partitioned) or per operation
    /// (interleaved) and waits for all of them. Results may be in a different
    /// order than the input.
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let groups: Vec<Vec<Operation>> = if self.interleave {
            batch.into_iter().map(|operation| vec![operation]).collect()
        } else {
            self.partition_by_user(batch).into_values().collect()
        };

        let mut tasks = Vec::with_capacity(groups.len());
        for operations in groups {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.apply_in_order(operations)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(group_results) => results.extend(group_results),
                Err(e) => error!(error = %e, "Batch task panicked"),
            }
        }

        results
    }
}
