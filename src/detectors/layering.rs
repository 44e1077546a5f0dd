//! Layering (spoofing) detector: place/cancel/opposite-trade sequences
//! within three tight windows.
//!
//! Ported from `original_source/src/layering_detection/detectors/layering_detector.py`,
//! preserving its hybrid linear/indexed scan (the source keeps two code
//! paths that must stay behavior-identical; here they are one function
//! branching internally, matching spec.md's "the spec treats this as a
//! single component" guidance).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::detectors::DetectionAlgorithm;
use crate::domain::model::{DetectionConfig, EventType, Side, SuspiciousSequence, TransactionEvent};
use crate::domain::{grouper, SurveillanceError};

/// Below this many events in a group, linear scans beat building an index.
/// A performance tuning parameter only — both paths must agree on output.
const INDEX_THRESHOLD: usize = 100;

type EventIndex = BTreeMap<(EventType, Side), Vec<DateTime<Utc>>>;

fn build_event_index(events: &[TransactionEvent]) -> EventIndex {
    let mut index: EventIndex = BTreeMap::new();
    for e in events {
        index
            .entry((e.event_type, e.side))
            .or_default()
            .push(e.timestamp);
    }
    for timestamps in index.values_mut() {
        timestamps.sort();
    }
    index
}

/// Half-open-at-start, closed-at-end binary search: `[start, end]` inclusive.
fn query_window<'a>(
    index: &'a EventIndex,
    event_type: EventType,
    side: Side,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> &'a [DateTime<Utc>] {
    if start > end {
        return &[];
    }
    let Some(timestamps) = index.get(&(event_type, side)) else {
        return &[];
    };
    let lo = timestamps.partition_point(|t| *t < start);
    let hi = timestamps.partition_point(|t| *t <= end);
    &timestamps[lo..hi]
}

fn linear_window_count(
    events: &[TransactionEvent],
    event_type: EventType,
    side: Side,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> usize {
    events
        .iter()
        .filter(|e| e.event_type == event_type && e.side == side && e.timestamp >= start && e.timestamp <= end)
        .count()
}

fn linear_first_trade(
    events: &[TransactionEvent],
    side: Side,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    events
        .iter()
        .find(|e| {
            e.event_type == EventType::TradeExecuted
                && e.side == side
                && e.timestamp >= start
                && e.timestamp <= end
        })
        .map(|e| e.timestamp)
}

struct AggregationMetrics {
    spoof_cancel_qty: u64,
    num_cancelled_orders: u32,
    opp_trade_qty: u64,
}

fn aggregate_metrics(
    events: &[TransactionEvent],
    index: Option<&EventIndex>,
    side: Side,
    opposite_side: Side,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AggregationMetrics {
    match index {
        Some(index) => {
            let cancels = query_window(index, EventType::OrderCancelled, side, start, end);
            let trades = query_window(index, EventType::TradeExecuted, opposite_side, start, end);
            // Quantities aren't in the timestamp index; re-scan events restricted
            // to the matched timestamps. Groups are small per (account, product)
            // so this stays linear in the sequence length, not the whole batch.
            let spoof_cancel_qty: u64 = events
                .iter()
                .filter(|e| {
                    e.event_type == EventType::OrderCancelled
                        && e.side == side
                        && cancels.contains(&e.timestamp)
                })
                .map(|e| e.quantity)
                .sum();
            let opp_trade_qty: u64 = events
                .iter()
                .filter(|e| {
                    e.event_type == EventType::TradeExecuted
                        && e.side == opposite_side
                        && trades.contains(&e.timestamp)
                })
                .map(|e| e.quantity)
                .sum();
            AggregationMetrics {
                spoof_cancel_qty,
                num_cancelled_orders: cancels.len() as u32,
                opp_trade_qty,
            }
        }
        None => {
            let mut spoof_cancel_qty = 0u64;
            let mut num_cancelled_orders = 0u32;
            let mut opp_trade_qty = 0u64;
            for e in events {
                if e.timestamp < start || e.timestamp > end {
                    continue;
                }
                if e.event_type == EventType::OrderCancelled && e.side == side {
                    spoof_cancel_qty += e.quantity;
                    num_cancelled_orders += 1;
                } else if e.event_type == EventType::TradeExecuted && e.side == opposite_side {
                    opp_trade_qty += e.quantity;
                }
            }
            AggregationMetrics {
                spoof_cancel_qty,
                num_cancelled_orders,
                opp_trade_qty,
            }
        }
    }
}

fn detect_for_group(
    account_id: &str,
    product_id: &str,
    events: &[TransactionEvent],
    config: &DetectionConfig,
) -> Vec<SuspiciousSequence> {
    let mut sequences = Vec::new();
    let n = events.len();

    let use_index = n >= INDEX_THRESHOLD;
    let index = use_index.then(|| build_event_index(events));

    let mut idx = 0usize;
    while idx < n {
        let ev = &events[idx];
        if ev.event_type != EventType::OrderPlaced {
            idx += 1;
            continue;
        }

        let side = ev.side;
        let start_ts = ev.timestamp;

        // 1) same-side placements within orders_window of the first.
        let mut window_orders = vec![ev.timestamp];
        let mut last_order_idx = idx;
        let mut j = idx + 1;
        while j < n && events[j].timestamp - start_ts <= config.orders_window {
            let cand = &events[j];
            if cand.event_type == EventType::OrderPlaced && cand.side == side {
                window_orders.push(cand.timestamp);
                last_order_idx = j;
            }
            j += 1;
        }

        if window_orders.len() < 3 {
            idx += 1;
            continue;
        }

        // 2) at least 3 cancellations within cancel_window of the last placement.
        let last_order_time = *window_orders.last().unwrap();
        let cancel_deadline = last_order_time + config.cancel_window;

        let num_cancels = match &index {
            Some(index) => query_window(index, EventType::OrderCancelled, side, start_ts, cancel_deadline).len(),
            None => linear_window_count(events, EventType::OrderCancelled, side, start_ts, cancel_deadline),
        };

        if num_cancels < 3 {
            idx += 1;
            continue;
        }

        let last_cancel_time = match &index {
            Some(index) => *query_window(index, EventType::OrderCancelled, side, start_ts, cancel_deadline)
                .iter()
                .max()
                .unwrap(),
            None => events
                .iter()
                .filter(|e| {
                    e.event_type == EventType::OrderCancelled
                        && e.side == side
                        && e.timestamp >= start_ts
                        && e.timestamp <= cancel_deadline
                })
                .map(|e| e.timestamp)
                .max()
                .unwrap(),
        };

        // 3) earliest opposite-side trade within opposite_trade_window of the last cancel.
        let opposite_side = side.opposite();
        let trade_deadline = last_cancel_time + config.opposite_trade_window;

        let opposite_trade = match &index {
            Some(index) => query_window(index, EventType::TradeExecuted, opposite_side, last_cancel_time, trade_deadline)
                .first()
                .copied(),
            None => linear_first_trade(events, opposite_side, last_cancel_time, trade_deadline),
        };

        let Some(end_ts) = opposite_trade else {
            idx += 1;
            continue;
        };

        let metrics = aggregate_metrics(events, index.as_ref(), side, opposite_side, start_ts, end_ts);

        let (total_buy_qty, total_sell_qty) = match side {
            Side::Buy => (metrics.spoof_cancel_qty, metrics.opp_trade_qty),
            Side::Sell => (metrics.opp_trade_qty, metrics.spoof_cancel_qty),
        };

        sequences.push(SuspiciousSequence::Layering {
            account_id: account_id.to_string(),
            product_id: product_id.to_string(),
            start_timestamp: start_ts,
            end_timestamp: end_ts,
            total_buy_qty,
            total_sell_qty,
            side,
            num_cancelled_orders: metrics.num_cancelled_orders,
            order_timestamps: window_orders,
        });

        // Advance past the last placement consumed, not just one step, so a
        // placement belongs to at most one emitted sequence.
        idx = last_order_idx + 1;
    }

    sequences
}

/// Top-level entry point: groups events and runs per-group detection.
pub fn detect_suspicious_sequences(
    events: &[TransactionEvent],
    config: &DetectionConfig,
) -> Vec<SuspiciousSequence> {
    let grouped = grouper::group(events);
    let mut all = Vec::new();
    for (key, group_events) in grouped {
        all.extend(detect_for_group(
            &key.account_id,
            &key.product_id,
            &group_events,
            config,
        ));
    }
    all
}

/// Registry-facing plugin wrapper. Stateless; `filter_events` keeps only
/// the three event types layering cares about.
pub struct LayeringAlgorithm {
    pub config: DetectionConfig,
}

impl Default for LayeringAlgorithm {
    fn default() -> Self {
        Self {
            config: DetectionConfig::default(),
        }
    }
}

impl DetectionAlgorithm for LayeringAlgorithm {
    fn name(&self) -> &'static str {
        "layering"
    }

    fn description(&self) -> &'static str {
        "Detects place/cancel/opposite-trade spoofing sequences within configurable timing windows"
    }

    fn filter_events(&self, events: &[TransactionEvent]) -> Vec<TransactionEvent> {
        events
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    EventType::OrderPlaced | EventType::OrderCancelled | EventType::TradeExecuted
                )
            })
            .cloned()
            .collect()
    }

    fn detect(&self, events: &[TransactionEvent]) -> Result<Vec<SuspiciousSequence>, SurveillanceError> {
        Ok(detect_suspicious_sequences(events, &self.config))
    }
}
