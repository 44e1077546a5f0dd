//! Order-independent content fingerprint and request id generation.
//!
//! Grounded in `original_source/services/orchestrator-service/utils.py`:
//! `generate_request_id` / `hash_events`. Events are reduced to tuples,
//! tuples sorted, then hashed — so identical event sets fingerprint
//! identically regardless of traversal order, and any field difference in
//! any event changes the fingerprint.

use sha2::{Digest, Sha256};

use crate::domain::model::TransactionEvent;

/// Fresh opaque per-invocation identifier (36-character UUID v4 form).
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 64-character lowercase hex SHA-256 over the order-independent canonical
/// serialization of `events`.
///
/// Price is serialized via its exact textual decimal form (`Decimal`'s
/// `Display`, which preserves trailing zeros as written), so `100.50` and
/// `100.5` fingerprint differently.
pub fn fingerprint(events: &[TransactionEvent]) -> String {
    let mut signatures: Vec<String> = events
        .iter()
        .map(|e| {
            serde_json::json!([
                e.timestamp.to_rfc3339(),
                e.account_id,
                e.product_id,
                e.side.as_str(),
                e.price.to_string(),
                e.quantity,
                e.event_type.as_str(),
            ])
            .to_string()
        })
        .collect();

    signatures.sort();

    let payload = serde_json::to_string(&signatures).expect("tuple signatures always serialize");

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EventType, Side};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn event(account: &str, ts_secs: i64, price: rust_decimal::Decimal) -> TransactionEvent {
        TransactionEvent {
            timestamp: Utc.timestamp_opt(1_736_937_000 + ts_secs, 0).unwrap(),
            account_id: account.into(),
            product_id: "IBM".into(),
            side: Side::Buy,
            price,
            quantity: 1000,
            event_type: EventType::OrderPlaced,
        }
    }

    #[test]
    fn fingerprint_is_permutation_invariant() {
        let e1 = event("ACC001", 0, dec!(100.50));
        let e2 = event("ACC002", 60, dec!(200.75));
        assert_eq!(
            fingerprint(&[e1.clone(), e2.clone()]),
            fingerprint(&[e2, e1])
        );
    }

    #[test]
    fn fingerprint_changes_with_any_field() {
        let e1 = event("ACC001", 0, dec!(100.50));
        let mut e2 = e1.clone();
        e2.account_id = "ACC002".into();
        assert_ne!(fingerprint(&[e1.clone()]), fingerprint(&[e2]));

        let mut e3 = e1.clone();
        e3.price = dec!(100.5); // textual form differs from "100.50"
        assert_ne!(fingerprint(&[e1]), fingerprint(&[e3]));
    }

    #[test]
    fn fingerprint_is_64_char_lowercase_hex() {
        let e1 = event("ACC001", 0, dec!(100.50));
        let fp = fingerprint(&[e1]);
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn request_id_is_36_char_uuid_form() {
        let id = generate_request_id();
        assert_eq!(id.len(), 36);
        assert_eq!(id.matches('-').count(), 4);
    }
}
