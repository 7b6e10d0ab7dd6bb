//! CSV format handling for operation records, balance and history output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain operations
//! - Balance and history output serialization
//!
//! All functions are pure (no file handling) for easy testing.

use csv::{Writer, WriterBuilder};
use serde::Deserialize;
use std::io::Write;

use crate::types::{Balance, LedgerError, Operation, Transaction, TransactionKind, UserId};

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: type, user, amount.
/// The amount stays a string here so that a missing or malformed amount is
/// reported with the operation it belongs to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub user: UserId,
    pub amount: Option<String>,
}

/// Convert a CsvRecord to an Operation
///
/// The type is matched case-insensitively. The amount must be present and an
/// integer; its sign is not checked here, the ledger rejects non-positive
/// amounts itself.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Operation, LedgerError> {
    let kind = match csv_record.op_type.to_lowercase().as_str() {
        "charge" => TransactionKind::Charge,
        "use" => TransactionKind::Use,
        _ => {
            return Err(LedgerError::parse_error(
                None,
                format!(
                    "Invalid operation type '{}' for user {}",
                    csv_record.op_type, csv_record.user
                ),
            ))
        }
    };

    let amount = match csv_record.amount.as_deref().map(str::trim) {
        Some(amount_str) if !amount_str.is_empty() => {
            amount_str.parse::<i64>().map_err(|_| {
                LedgerError::parse_error(
                    None,
                    format!(
                        "Invalid amount '{}' for user {}",
                        amount_str, csv_record.user
                    ),
                )
            })?
        }
        _ => {
            return Err(LedgerError::parse_error(
                None,
                format!(
                    "{} operation for user {} requires an amount",
                    kind, csv_record.user
                ),
            ))
        }
    };

    Ok(Operation {
        kind,
        user: csv_record.user,
        amount,
    })
}

/// Attach a line number to a parse error that does not carry one yet
pub(crate) fn at_line(error: LedgerError, line: u64) -> LedgerError {
    match error {
        LedgerError::ParseError {
            line: None,
            message,
        } => LedgerError::ParseError {
            line: Some(line),
            message,
        },
        other => other,
    }
}

/// CSV writer that leaves the header row to the caller
///
/// Headers are written explicitly so an empty report still has one.
fn report_writer(output: &mut dyn Write) -> Writer<&mut dyn Write> {
    WriterBuilder::new().has_headers(false).from_writer(output)
}

/// Write balances to CSV format
///
/// Writes balances with columns: user, point, updated_at.
/// Balances are sorted by user for deterministic output.
pub fn write_balances_csv(
    balances: &[Balance],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = report_writer(output);

    writer.write_record(["user", "point", "updated_at"])?;

    let mut sorted_balances = balances.to_vec();
    sorted_balances.sort_by_key(|balance| balance.user);

    for balance in sorted_balances {
        writer.serialize(balance)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write history records to CSV format
///
/// Writes records with columns: id, user, type, amount, balance_after,
/// occurred_at. Records are sorted by history id.
pub fn write_history_csv(
    records: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = report_writer(output);

    writer.write_record(["id", "user", "type", "amount", "balance_after", "occurred_at"])?;

    let mut sorted_records = records.to_vec();
    sorted_records.sort_by_key(|record| record.id);

    for record in sorted_records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rstest::rstest;

    fn record(op_type: &str, user: UserId, amount: Option<&str>) -> CsvRecord {
        CsvRecord {
            op_type: op_type.to_string(),
            user,
            amount: amount.map(|s| s.to_string()),
        }
    }

    #[rstest]
    #[case("charge", TransactionKind::Charge, "5000", 5000)]
    #[case("use", TransactionKind::Use, "3000", 3000)]
    #[case("CHARGE", TransactionKind::Charge, "10", 10)] // case insensitive
    #[case("Use", TransactionKind::Use, " 7 ", 7)]
    #[case("charge", TransactionKind::Charge, "-1000", -1000)] // the ledger rejects it
    fn test_convert_csv_record_valid(
        #[case] op_type: &str,
        #[case] expected_kind: TransactionKind,
        #[case] amount: &str,
        #[case] expected_amount: i64,
    ) {
        let operation = convert_csv_record(record(op_type, 1, Some(amount))).unwrap();

        assert_eq!(operation.kind, expected_kind);
        assert_eq!(operation.user, 1);
        assert_eq!(operation.amount, expected_amount);
    }

    #[rstest]
    #[case::unknown_type(record("refund", 1, Some("10")), "Invalid operation type 'refund'")]
    #[case::missing_amount(record("charge", 1, None), "CHARGE operation for user 1 requires an amount")]
    #[case::blank_amount(record("use", 1, Some("  ")), "USE operation for user 1 requires an amount")]
    #[case::fractional_amount(record("charge", 2, Some("1.5")), "Invalid amount '1.5' for user 2")]
    #[case::text_amount(record("charge", 2, Some("abc")), "Invalid amount 'abc' for user 2")]
    fn test_convert_csv_record_invalid(#[case] csv_record: CsvRecord, #[case] message: &str) {
        let error = convert_csv_record(csv_record).unwrap_err();

        assert!(matches!(error, LedgerError::ParseError { .. }));
        assert!(
            error.to_string().contains(message),
            "'{}' should contain '{}'",
            error,
            message
        );
    }

    #[test]
    fn test_write_balances_csv_sorted_by_user() {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        let balances = vec![
            Balance::new(2, 50, epoch),
            Balance::new(1, 2000, DateTime::from_timestamp_millis(1_500).unwrap()),
        ];
        let mut output = Vec::new();

        write_balances_csv(&balances, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "user,point,updated_at\n\
             1,2000,1970-01-01T00:00:01.500Z\n\
             2,50,1970-01-01T00:00:00.000Z\n"
        );
    }

    #[test]
    fn test_write_balances_csv_empty() {
        let mut output = Vec::new();
        write_balances_csv(&[], &mut output).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "user,point,updated_at\n");
    }

    #[test]
    fn test_write_history_csv_empty() {
        let mut output = Vec::new();
        write_history_csv(&[], &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,user,type,amount,balance_after,occurred_at\n"
        );
    }

    #[test]
    fn test_write_history_csv() {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        let records = vec![
            Transaction {
                id: 2,
                user: 1,
                kind: TransactionKind::Use,
                amount: 3000,
                balance_after: 2000,
                occurred_at: epoch,
            },
            Transaction {
                id: 1,
                user: 1,
                kind: TransactionKind::Charge,
                amount: 5000,
                balance_after: 5000,
                occurred_at: epoch,
            },
        ];
        let mut output = Vec::new();

        write_history_csv(&records, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,user,type,amount,balance_after,occurred_at\n\
             1,1,CHARGE,5000,5000,1970-01-01T00:00:00.000Z\n\
             2,1,USE,3000,2000,1970-01-01T00:00:00.000Z\n"
        );
    }
}
