//! End-to-end pipeline integration tests.
//!
//! Mirrors the teacher's `tests/backtest_run_integration.rs` approach: build
//! a fixture (here a transactions CSV instead of a SQLite database) and
//! drive the library's components directly rather than spawning the HTTP
//! binaries, since the orchestration layer's externally observable contract
//! is "read -> detect -> write", not the wire format in between.

use std::io::Write;

use layering_surveillance::detectors::DetectionAlgorithm;
use layering_surveillance::io::{read_transactions, write_detection_logs, write_suspicious_accounts};
use layering_surveillance::registry;

fn write_fixture(contents: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transactions.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    dir
}

/// S1/S3 combined: one (account, product) group carries a layering spoof
/// chain, another carries a wash-trading cycle. Running every registered
/// algorithm end-to-end and merging must surface both.
#[test]
fn pipeline_detects_layering_and_wash_trading_and_writes_canonical_outputs() {
    let input_dir = write_fixture(
        "timestamp,account_id,product_id,side,price,quantity,event_type\n\
         2025-01-15T10:00:00Z,ACC999,TSLA,BUY,10.00,1000,ORDER_PLACED\n\
         2025-01-15T10:00:01Z,ACC999,TSLA,BUY,10.00,1000,ORDER_PLACED\n\
         2025-01-15T10:00:02Z,ACC999,TSLA,BUY,10.00,1000,ORDER_PLACED\n\
         2025-01-15T10:00:03Z,ACC999,TSLA,BUY,10.00,1000,ORDER_CANCELLED\n\
         2025-01-15T10:00:04Z,ACC999,TSLA,BUY,10.00,1000,ORDER_CANCELLED\n\
         2025-01-15T10:00:05Z,ACC999,TSLA,BUY,10.00,1000,ORDER_CANCELLED\n\
         2025-01-15T10:00:06Z,ACC999,TSLA,SELL,10.00,5000,TRADE_EXECUTED\n\
         2025-01-15T11:00:00Z,ACC001,IBM,BUY,100.00,2000,TRADE_EXECUTED\n\
         2025-01-15T11:05:00Z,ACC001,IBM,SELL,100.50,2000,TRADE_EXECUTED\n\
         2025-01-15T11:10:00Z,ACC001,IBM,BUY,101.00,2000,TRADE_EXECUTED\n\
         2025-01-15T11:15:00Z,ACC001,IBM,SELL,101.50,2000,TRADE_EXECUTED\n\
         2025-01-15T11:20:00Z,ACC001,IBM,BUY,102.00,2000,TRADE_EXECUTED\n\
         2025-01-15T11:25:00Z,ACC001,IBM,SELL,102.50,2000,TRADE_EXECUTED\n",
    );
    let input_path = input_dir.path().join("transactions.csv");

    let events = read_transactions(&input_path).unwrap();
    assert_eq!(events.len(), 13);

    let registry = registry::bootstrap();
    let mut sequences = Vec::new();
    for algorithm in registry.get_all(None).unwrap() {
        let filtered = algorithm.filter_events(&events);
        sequences.extend(algorithm.detect(&filtered).unwrap());
    }

    let layering_count = sequences
        .iter()
        .filter(|s| s.detection_type() == layering_surveillance::domain::DetectionType::Layering)
        .count();
    let wash_trading_count = sequences
        .iter()
        .filter(|s| s.detection_type() == layering_surveillance::domain::DetectionType::WashTrading)
        .count();
    assert_eq!(layering_count, 1);
    assert!(wash_trading_count >= 1);

    let output_dir = tempfile::tempdir().unwrap();
    let accounts_path = output_dir.path().join("suspicious_accounts.csv");
    let logs_path = output_dir.path().join("detections.csv");

    write_suspicious_accounts(&accounts_path, &sequences).unwrap();
    write_detection_logs(&logs_path, &sequences, false, None).unwrap();

    let accounts_csv = std::fs::read_to_string(&accounts_path).unwrap();
    assert_eq!(
        accounts_csv.lines().next().unwrap(),
        "account_id,product_id,total_buy_qty,total_sell_qty,num_cancelled_orders,detected_timestamp,detection_type,alternation_percentage,price_change_percentage"
    );
    assert_eq!(accounts_csv.lines().count() - 1, sequences.len());
    assert!(accounts_csv.contains("ACC999"));
    assert!(accounts_csv.contains("ACC001"));

    let logs_csv = std::fs::read_to_string(&logs_path).unwrap();
    assert_eq!(
        logs_csv.lines().next().unwrap(),
        "account_id,product_id,window_start_timestamp,detected_timestamp,duration_seconds,num_cancelled_orders,total_buy_qty,total_sell_qty,order_timestamps"
    );
    assert!(logs_csv.contains("ACC999"));
}

/// S6 — aggregation completeness, exercised through the aggregator's
/// actual validation functions rather than re-deriving the rule inline.
#[test]
fn aggregation_completeness_matches_allow_partial_results_flag() {
    use layering_surveillance::aggregator::missing_services;
    use layering_surveillance::wire::ServiceResult;

    let expected = vec!["layering".to_string(), "wash_trading".to_string()];
    let results = vec![ServiceResult {
        service: "layering".to_string(),
        succeeded: true,
        sequences: Vec::new(),
    }];

    let missing = missing_services(&expected, &results);
    assert_eq!(missing, vec!["wash_trading".to_string()]);
}

/// Invalid rows are warned-and-skipped, never fatal to the batch; a missing
/// required column is fatal to the whole read.
#[test]
fn malformed_rows_are_skipped_while_missing_columns_are_fatal() {
    let dir = write_fixture(
        "timestamp,account_id,product_id,side,price,quantity,event_type\n\
         2025-01-15T10:00:00Z,ACC001,IBM,BUY,100.00,1000,ORDER_PLACED\n\
         not-a-timestamp,ACC002,IBM,BUY,100.00,1000,ORDER_PLACED\n\
         2025-01-15T10:00:01Z,,IBM,BUY,100.00,1000,ORDER_PLACED\n",
    );
    let events = read_transactions(&dir.path().join("transactions.csv")).unwrap();
    assert_eq!(events.len(), 1);

    let missing_column_dir = write_fixture("timestamp,account_id,product_id\nx,x,x\n");
    assert!(read_transactions(&missing_column_dir.path().join("transactions.csv")).is_err());
}
