//! Metrics collection.
//!
//! # Metrics
//! - `ledger_submissions_total` (counter): bundles accepted by the node
//! - `ledger_submitted_transactions_total` (counter): records in those bundles
//! - `ledger_rejections_total` (counter): bundles refused by the node
//! - `ledger_confirmations_total` (counter): terminal wait outcomes by `outcome`
//! - `ledger_rpc_errors_total` (counter): transient node errors by `operation`

use metrics::counter;

pub fn record_submission(size: usize) {
    counter!("ledger_submissions_total").increment(1);
    counter!("ledger_submitted_transactions_total").increment(size as u64);
}

pub fn record_rejection() {
    counter!("ledger_rejections_total").increment(1);
}

pub fn record_confirmation(outcome: &'static str) {
    counter!("ledger_confirmations_total", "outcome" => outcome).increment(1);
}

pub fn record_rpc_error(operation: &'static str) {
    counter!("ledger_rpc_errors_total", "operation" => operation).increment(1);
}
