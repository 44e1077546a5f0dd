//! Wash-trading detector: sliding-window alternating self-offsetting trades.
//!
//! Ported from
//! `original_source/src/layering_detection/detectors/wash_trading_detector.py`.
//! Input is expected to already be filtered to `TRADE_EXECUTED` events —
//! `WashTradingAlgorithm::filter_events` does that filtering for callers
//! that go through the registry.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;

use crate::detectors::DetectionAlgorithm;
use crate::domain::model::{EventType, Side, SuspiciousSequence, TransactionEvent, WashTradingConfig};
use crate::domain::{grouper, SurveillanceError};

fn alternation_percentage(trades: &[&TransactionEvent]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let switches = trades
        .windows(2)
        .filter(|pair| pair[0].side != pair[1].side)
        .count();
    (switches as f64 / (trades.len() - 1) as f64) * 100.0
}

fn price_change_percentage(trades: &[&TransactionEvent]) -> Option<f64> {
    let first = trades.first()?;
    let last = trades.last()?;
    let first_price = first.price.to_f64()?;
    if first_price == 0.0 {
        return None;
    }
    let last_price = last.price.to_f64()?;
    Some(((last_price - first_price) / first_price).abs() * 100.0)
}

/// Two-pointer window collection: for the window starting at `start_idx`,
/// advance the end pointer forward only — O(n) amortized across all starts.
fn collect_window<'a>(
    trades: &'a [TransactionEvent],
    start_idx: usize,
    window_size: chrono::Duration,
) -> Vec<&'a TransactionEvent> {
    let window_start = trades[start_idx].timestamp;
    let window_end = window_start + window_size;
    let mut end_idx = start_idx;
    while end_idx < trades.len() && trades[end_idx].timestamp <= window_end {
        end_idx += 1;
    }
    trades[start_idx..end_idx].iter().collect()
}

fn detect_for_group(
    account_id: &str,
    product_id: &str,
    trades: &[TransactionEvent],
    config: &WashTradingConfig,
) -> Vec<SuspiciousSequence> {
    let min_total = (config.min_buy_trades + config.min_sell_trades) as usize;
    if trades.len() < min_total {
        return Vec::new();
    }

    let mut sequences = Vec::new();

    for start_idx in 0..trades.len() {
        let window_trades = collect_window(trades, start_idx, config.window_size);

        if window_trades.len() < min_total {
            continue;
        }

        let buy_trades: Vec<&TransactionEvent> = window_trades
            .iter()
            .filter(|t| t.side == Side::Buy)
            .copied()
            .collect();
        let sell_trades: Vec<&TransactionEvent> = window_trades
            .iter()
            .filter(|t| t.side == Side::Sell)
            .copied()
            .collect();

        if buy_trades.len() < config.min_buy_trades as usize
            || sell_trades.len() < config.min_sell_trades as usize
        {
            continue;
        }

        let total_volume: u64 = window_trades.iter().map(|t| t.quantity).sum();
        if total_volume < config.min_total_volume {
            continue;
        }

        let alternation = alternation_percentage(&window_trades);
        if alternation < config.min_alternation_percentage {
            continue;
        }

        let total_buy_qty: u64 = buy_trades.iter().map(|t| t.quantity).sum();
        let total_sell_qty: u64 = sell_trades.iter().map(|t| t.quantity).sum();

        let price_change = price_change_percentage(&window_trades)
            .filter(|pct| *pct >= config.optional_price_change_threshold);

        let window_start: DateTime<Utc> = window_trades[0].timestamp;
        let window_end: DateTime<Utc> = window_trades.last().unwrap().timestamp;

        sequences.push(SuspiciousSequence::WashTrading {
            account_id: account_id.to_string(),
            product_id: product_id.to_string(),
            start_timestamp: window_start,
            end_timestamp: window_end,
            total_buy_qty,
            total_sell_qty,
            alternation_percentage: alternation,
            price_change_percentage: price_change,
        });
    }

    sequences
}

/// Top-level entry point: groups trades and runs the sliding window per group.
pub fn detect_wash_trading(
    events: &[TransactionEvent],
    config: &WashTradingConfig,
) -> Vec<SuspiciousSequence> {
    let grouped = grouper::group(events);
    let mut all = Vec::new();
    for (key, group_trades) in grouped {
        all.extend(detect_for_group(
            &key.account_id,
            &key.product_id,
            &group_trades,
            config,
        ));
    }
    all
}

pub struct WashTradingAlgorithm {
    pub config: WashTradingConfig,
}

impl Default for WashTradingAlgorithm {
    fn default() -> Self {
        Self {
            config: WashTradingConfig::default(),
        }
    }
}

impl DetectionAlgorithm for WashTradingAlgorithm {
    fn name(&self) -> &'static str {
        "wash_trading"
    }

    fn description(&self) -> &'static str {
        "Detects rapid alternating self-offsetting buy/sell activity in a narrow window"
    }

    fn filter_events(&self, events: &[TransactionEvent]) -> Vec<TransactionEvent> {
        events
            .iter()
            .filter(|e| e.event_type == EventType::TradeExecuted)
            .cloned()
            .collect()
    }

    fn detect(&self, events: &[TransactionEvent]) -> Result<Vec<SuspiciousSequence>, SurveillanceError> {
        Ok(detect_wash_trading(events, &self.config))
    }
}
