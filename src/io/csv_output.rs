//! CSV writers for `suspicious_accounts.csv` and `detections.csv`.
//!
//! Schemas and formatting (2-decimal percentages, 3-decimal durations,
//! semicolon-joined timestamp lists) are grounded in
//! `original_source/src/layering_detection/utils/transaction_io.py`
//! (`write_suspicious_accounts`) and
//! `original_source/src/layering_detection/logging_utils.py`
//! (`write_detection_logs`).

use std::path::Path;

use crate::domain::model::SuspiciousSequence;
use crate::domain::SurveillanceError;
use crate::security::{pseudonymize_account_id, sanitize_for_csv};

fn io_err(e: std::io::Error) -> SurveillanceError {
    SurveillanceError::InputMalformed { reason: e.to_string() }
}

fn csv_err(e: csv::Error) -> SurveillanceError {
    SurveillanceError::InputMalformed { reason: e.to_string() }
}

/// Writes the account-level summary CSV. Wash-trading rows leave
/// `num_cancelled_orders` at `0` and layering rows leave the two
/// wash-trading-only columns empty, matching the source's shared-schema
/// approach (one row shape for both detection types, unused fields blank).
pub fn write_suspicious_accounts(
    path: &Path,
    sequences: &[SuspiciousSequence],
) -> Result<(), SurveillanceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record([
            "account_id",
            "product_id",
            "total_buy_qty",
            "total_sell_qty",
            "num_cancelled_orders",
            "detected_timestamp",
            "detection_type",
            "alternation_percentage",
            "price_change_percentage",
        ])
        .map_err(csv_err)?;

    for seq in sequences {
        let (num_cancelled_orders, alternation_pct, price_change_pct) = match seq {
            SuspiciousSequence::Layering { num_cancelled_orders, .. } => {
                (*num_cancelled_orders, String::new(), String::new())
            }
            SuspiciousSequence::WashTrading {
                alternation_percentage,
                price_change_percentage,
                ..
            } => (
                0,
                format!("{alternation_percentage:.2}"),
                price_change_percentage
                    .map(|p| format!("{p:.2}"))
                    .unwrap_or_default(),
            ),
        };

        writer
            .write_record([
                sanitize_for_csv(seq.account_id()),
                sanitize_for_csv(seq.product_id()),
                seq.total_buy_qty().to_string(),
                seq.total_sell_qty().to_string(),
                num_cancelled_orders.to_string(),
                seq.end_timestamp().to_rfc3339(),
                seq.detection_type().as_str().to_string(),
                alternation_pct,
                price_change_pct,
            ])
            .map_err(csv_err)?;
    }

    writer.flush().map_err(io_err)?;
    Ok(())
}

/// Writes the per-sequence detection log CSV. When `pseudonymize_accounts`
/// is set, `account_id` is replaced by its salted SHA-256 digest; `salt`
/// must be `Some` in that case (checked by the caller via
/// `crate::security::pseudonymization_salt`).
pub fn write_detection_logs(
    path: &Path,
    sequences: &[SuspiciousSequence],
    pseudonymize_accounts: bool,
    salt: Option<&str>,
) -> Result<(), SurveillanceError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record([
            "account_id",
            "product_id",
            "window_start_timestamp",
            "detected_timestamp",
            "duration_seconds",
            "num_cancelled_orders",
            "total_buy_qty",
            "total_sell_qty",
            "order_timestamps",
        ])
        .map_err(csv_err)?;

    for seq in sequences {
        let account_id = if pseudonymize_accounts {
            let salt = salt.ok_or_else(|| SurveillanceError::ConfigInvalid {
                field: "PSEUDONYMIZATION_SALT",
                reason: "required when pseudonymization is enabled".into(),
            })?;
            pseudonymize_account_id(seq.account_id(), salt)?
        } else {
            sanitize_for_csv(seq.account_id())
        };

        let duration_seconds =
            (seq.end_timestamp() - seq.start_timestamp()).num_milliseconds() as f64 / 1000.0;

        let (num_cancelled_orders, order_timestamps) = match seq {
            SuspiciousSequence::Layering {
                num_cancelled_orders,
                order_timestamps,
                ..
            } => (
                *num_cancelled_orders,
                order_timestamps
                    .iter()
                    .map(|ts| ts.to_rfc3339())
                    .collect::<Vec<_>>()
                    .join(";"),
            ),
            SuspiciousSequence::WashTrading { .. } => (0, String::new()),
        };

        writer
            .write_record([
                account_id,
                sanitize_for_csv(seq.product_id()),
                seq.start_timestamp().to_rfc3339(),
                seq.end_timestamp().to_rfc3339(),
                format!("{duration_seconds:.3}"),
                num_cancelled_orders.to_string(),
                seq.total_buy_qty().to_string(),
                seq.total_sell_qty().to_string(),
                order_timestamps,
            ])
            .map_err(csv_err)?;
    }

    writer.flush().map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn layering_seq() -> SuspiciousSequence {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        SuspiciousSequence::Layering {
            account_id: "ACC001".into(),
            product_id: "IBM".into(),
            start_timestamp: t0,
            end_timestamp: t0 + chrono::Duration::seconds(6),
            total_buy_qty: 3000,
            total_sell_qty: 5000,
            side: crate::domain::model::Side::Buy,
            num_cancelled_orders: 3,
            order_timestamps: vec![t0, t0 + chrono::Duration::seconds(1)],
        }
    }

    #[test]
    fn suspicious_accounts_csv_has_blank_wash_trading_columns_for_layering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suspicious_accounts.csv");
        write_suspicious_accounts(&path, &[layering_seq()]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        assert!(data_line.ends_with(",,"));
    }

    #[test]
    fn detection_logs_pseudonymize_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detections.csv");
        write_detection_logs(&path, &[layering_seq()], true, Some("salt")).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        assert!(!data_line.starts_with("ACC001"));
    }

    #[test]
    fn detection_logs_without_pseudonymization_keep_plain_account_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detections.csv");
        write_detection_logs(&path, &[layering_seq()], false, None).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let data_line = contents.lines().nth(1).unwrap();
        assert!(data_line.starts_with("ACC001"));
    }
}
