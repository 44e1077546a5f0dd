//! `transactions.csv` reader.
//!
//! Grounded in `original_source/src/layering_detection/utils/transaction_io.py`
//! (`read_transactions`): required-column check up front, then per-row
//! parsing where an invalid row is skipped with a warning rather than
//! aborting the whole read — malformed input shouldn't sink an otherwise
//! valid batch.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::model::{EventType, Side, TransactionEvent};
use crate::domain::SurveillanceError;

const REQUIRED_COLUMNS: [&str; 7] = [
    "timestamp",
    "account_id",
    "product_id",
    "side",
    "price",
    "quantity",
    "event_type",
];

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    let normalized = if let Some(stripped) = trimmed.strip_suffix('Z') {
        format!("{stripped}+00:00")
    } else {
        trimmed.to_string()
    };
    DateTime::parse_from_rfc3339(&normalized)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("invalid timestamp format: {raw:?}"))
}

fn parse_side(raw: &str) -> Result<Side, String> {
    match raw.trim().to_uppercase().as_str() {
        "BUY" => Ok(Side::Buy),
        "SELL" => Ok(Side::Sell),
        other => Err(format!("invalid side: {other:?}")),
    }
}

fn parse_event_type(raw: &str) -> Result<EventType, String> {
    match raw.trim().to_uppercase().as_str() {
        "ORDER_PLACED" => Ok(EventType::OrderPlaced),
        "ORDER_CANCELLED" => Ok(EventType::OrderCancelled),
        "TRADE_EXECUTED" => Ok(EventType::TradeExecuted),
        other => Err(format!("invalid event_type: {other:?}")),
    }
}

fn parse_price(raw: &str) -> Result<Decimal, String> {
    let price = Decimal::from_str(raw.trim()).map_err(|_| format!("invalid price: {raw:?}"))?;
    if price <= Decimal::ZERO {
        return Err(format!("price must be positive, got {price}"));
    }
    Ok(price)
}

fn parse_quantity(raw: &str) -> Result<u64, String> {
    let qty: i64 = raw.trim().parse().map_err(|_| format!("invalid quantity: {raw:?}"))?;
    if qty <= 0 {
        return Err(format!("quantity must be positive, got {qty}"));
    }
    Ok(qty as u64)
}

fn parse_row(record: &csv::StringRecord, headers: &csv::StringRecord) -> Result<TransactionEvent, String> {
    let field = |name: &str| -> Result<&str, String> {
        let idx = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| format!("missing column {name:?}"))?;
        record.get(idx).ok_or_else(|| format!("missing value for {name:?}"))
    };

    let timestamp = parse_timestamp(field("timestamp")?)?;
    let account_id = field("account_id")?.trim().to_string();
    let product_id = field("product_id")?.trim().to_string();
    let side = parse_side(field("side")?)?;
    let price = parse_price(field("price")?)?;
    let quantity = parse_quantity(field("quantity")?)?;
    let event_type = parse_event_type(field("event_type")?)?;

    if account_id.is_empty() {
        return Err("empty account_id".to_string());
    }
    if product_id.is_empty() {
        return Err("empty product_id".to_string());
    }

    Ok(TransactionEvent {
        timestamp,
        account_id,
        product_id,
        side,
        price,
        quantity,
        event_type,
    })
}

/// Reads `path` as a transactions CSV. Rows that fail to parse are skipped
/// with a `tracing::warn!`, not treated as a fatal error for the batch.
pub fn read_transactions(path: &Path) -> Result<Vec<TransactionEvent>, SurveillanceError> {
    if !path.exists() {
        return Err(SurveillanceError::InputNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| SurveillanceError::InputMalformed { reason: e.to_string() })?;

    let headers = reader
        .headers()
        .map_err(|e| SurveillanceError::InputMalformed { reason: e.to_string() })?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(SurveillanceError::InputMalformed {
            reason: format!("missing required CSV columns: {missing:?}"),
        });
    }

    let mut events = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let line = idx + 2; // header occupies line 1
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping unparsable CSV row");
                continue;
            }
        };
        match parse_row(&record, &headers) {
            Ok(event) => events.push(event),
            Err(reason) => {
                tracing::warn!(line, %reason, "skipping invalid row");
            }
        }
    }

    Ok(events)
}
