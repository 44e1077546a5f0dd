//! Groups a flat event stream by (account_id, product_id), sorting each
//! group by timestamp ascending with a stable sort (ties keep input order).

use std::collections::BTreeMap;

use crate::domain::model::{GroupKey, TransactionEvent};

/// `group(events) -> map<GroupKey, ordered_sequence<TransactionEvent>>`.
///
/// Complexity is O(n log n) dominated by the per-group stable sort. Empty
/// input yields an empty map.
pub fn group(events: &[TransactionEvent]) -> BTreeMap<GroupKey, Vec<TransactionEvent>> {
    let mut groups: BTreeMap<GroupKey, Vec<TransactionEvent>> = BTreeMap::new();

    for event in events {
        let key = GroupKey {
            account_id: event.account_id.clone(),
            product_id: event.product_id.clone(),
        };
        groups.entry(key).or_default().push(event.clone());
    }

    for bucket in groups.values_mut() {
        bucket.sort_by_key(|e| e.timestamp);
    }

    groups
}
