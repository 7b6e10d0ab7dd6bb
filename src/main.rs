//! Point Ledger CLI
//!
//! Command-line interface for applying point charges and uses from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > balances.csv
//! cargo run -- --strategy sync operations.csv > balances.csv
//! cargo run -- --strategy async --interleave --max-concurrent 8 operations.csv
//! cargo run -- --locking global --output history operations.csv > history.csv
//! ```
//!
//! Rejected operations and unparseable rows are logged to stderr; set
//! `RUST_LOG=debug` to see every applied transaction.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, file not readable, output not writable, etc.)

use point_ledger::cli;
use point_ledger::strategy;
use std::process;

fn main() {
    let args = cli::parse_args();
    cli::init_tracing();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config, args.to_ledger_settings())
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        tracing::error!(error = %e, code = e.code(), "Run failed");
        process::exit(1);
    }
}
