//! CSV input/output for the transaction pipeline.

pub mod csv_input;
pub mod csv_output;

pub use csv_input::read_transactions;
pub use csv_output::{write_detection_logs, write_suspicious_accounts};
