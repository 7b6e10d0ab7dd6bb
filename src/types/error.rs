//! Error types for the point ledger
//!
//! This module defines all error types that can occur while applying charges
//! and uses or while running the batch CLI.
//!
//! # Error Categories
//!
//! - **Rejections**: invalid amount, insufficient balance, balance overflow.
//!   Detected before any store mutation, so nothing is ever partially applied.
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **CSV Parsing Errors**: Malformed CSV, invalid operation types, etc.
//!
//! Looking up a user that has never been referenced is not an error: it yields
//! a zero balance and an empty history.

use thiserror::Error;

use super::transaction::{Points, UserId};

/// Main error type for the point ledger
///
/// Each variant includes enough context to explain the failure in a log line
/// without consulting the ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Charge or use requested with an amount of zero or less
    ///
    /// No store mutation occurs.
    #[error("Invalid amount {amount} for user {user}: amount must be positive")]
    InvalidAmount {
        /// User the operation was addressed to
        user: UserId,
        /// The rejected amount
        amount: i64,
    },

    /// Use requested for more points than the balance holds
    ///
    /// Checked against the balance read while the user's guard was held.
    /// No store mutation occurs.
    #[error("Insufficient balance for user {user}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// User ID
        user: UserId,
        /// Balance at the time of the check
        available: Points,
        /// Requested use amount
        requested: Points,
    },

    /// Charge would push the balance past the representable maximum
    #[error("Balance overflow for user {user}: current {current}, requested {requested}")]
    BalanceOverflow {
        /// User ID
        user: UserId,
        /// Balance at the time of the check
        current: Points,
        /// Requested charge amount
        requested: Points,
    },

    /// File not found at the specified path
    ///
    /// This is a fatal error that prevents processing from starting.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading input or writing output
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// The malformed record is skipped and processing continues.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            return LedgerError::IoError {
                message: error.to_string(),
            };
        }

        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(user: UserId, amount: i64) -> Self {
        LedgerError::InvalidAmount { user, amount }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user: UserId, available: Points, requested: Points) -> Self {
        LedgerError::InsufficientBalance {
            user,
            available,
            requested,
        }
    }

    /// Create a BalanceOverflow error
    pub fn balance_overflow(user: UserId, current: Points, requested: Points) -> Self {
        LedgerError::BalanceOverflow {
            user,
            current,
            requested,
        }
    }

    /// Create a ParseError error
    pub fn parse_error(line: Option<u64>, message: impl Into<String>) -> Self {
        LedgerError::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Stable error code for transport layers
    ///
    /// `100` invalid input, `102` insufficient balance, `103` overflow,
    /// `500` I/O failure.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount { .. } | LedgerError::ParseError { .. } => "100",
            LedgerError::InsufficientBalance { .. } => "102",
            LedgerError::BalanceOverflow { .. } => "103",
            LedgerError::FileNotFound { .. } | LedgerError::IoError { .. } => "500",
        }
    }

    /// Whether this error is a business rejection of a single operation
    ///
    /// Rejections leave the ledger unchanged and do not stop a batch run.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::BalanceOverflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_amount(
        LedgerError::InvalidAmount { user: 1, amount: -1000 },
        "Invalid amount -1000 for user 1: amount must be positive"
    )]
    #[case::insufficient_balance(
        LedgerError::InsufficientBalance { user: 1, available: 5000, requested: 6000 },
        "Insufficient balance for user 1: available 5000, requested 6000"
    )]
    #[case::balance_overflow(
        LedgerError::BalanceOverflow { user: 3, current: u64::MAX, requested: 1 },
        "Balance overflow for user 3: current 18446744073709551615, requested 1"
    )]
    #[case::file_not_found(
        LedgerError::FileNotFound { path: "ops.csv".to_string() },
        "File not found: ops.csv"
    )]
    #[case::io_error(
        LedgerError::IoError { message: "Permission denied".to_string() },
        "I/O error: Permission denied"
    )]
    #[case::parse_error_with_line(
        LedgerError::ParseError { line: Some(42), message: "Invalid field".to_string() },
        "CSV parse error at line 42: Invalid field"
    )]
    #[case::parse_error_without_line(
        LedgerError::ParseError { line: None, message: "Invalid field".to_string() },
        "CSV parse error: Invalid field"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::invalid_amount(LedgerError::invalid_amount(1, 0), "100", true)]
    #[case::parse_error(LedgerError::parse_error(Some(2), "bad"), "100", false)]
    #[case::insufficient_balance(LedgerError::insufficient_balance(1, 0, 1), "102", true)]
    #[case::balance_overflow(LedgerError::balance_overflow(1, u64::MAX, 1), "103", true)]
    #[case::io_error(LedgerError::IoError { message: "disk".to_string() }, "500", false)]
    fn test_code_and_rejection(
        #[case] error: LedgerError,
        #[case] code: &str,
        #[case] rejection: bool,
    ) {
        assert_eq!(error.code(), code);
        assert_eq!(error.is_rejection(), rejection);
    }

    #[rstest]
    #[case::invalid_amount(
        LedgerError::invalid_amount(1, -5),
        LedgerError::InvalidAmount { user: 1, amount: -5 }
    )]
    #[case::insufficient_balance(
        LedgerError::insufficient_balance(1, 10, 20),
        LedgerError::InsufficientBalance { user: 1, available: 10, requested: 20 }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: LedgerError = io_error.into();
        assert!(matches!(error, LedgerError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
