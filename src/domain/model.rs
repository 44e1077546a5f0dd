//! Domain types for the layering / wash-trading surveillance pipeline.
//!
//! Mirrors the frozen dataclasses of the analytics this service replaces:
//! `TransactionEvent`, `DetectionConfig`, `WashTradingConfig` and
//! `SuspiciousSequence` are immutable value types created at parse time and
//! never mutated afterwards.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::error::SurveillanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    OrderPlaced,
    OrderCancelled,
    TradeExecuted,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::OrderPlaced => "ORDER_PLACED",
            EventType::OrderCancelled => "ORDER_CANCELLED",
            EventType::TradeExecuted => "TRADE_EXECUTED",
        }
    }
}

/// Single immutable domain record, created during parse and destroyed with
/// the batch that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub timestamp: DateTime<Utc>,
    pub account_id: String,
    pub product_id: String,
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
    pub event_type: EventType,
}

/// (account_id, product_id) — the unit all pattern detection is local to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub account_id: String,
    pub product_id: String,
}

/// Timing windows for the layering detector. All three must be strictly
/// positive; construction is the only place this is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionConfig {
    pub orders_window: chrono::Duration,
    pub cancel_window: chrono::Duration,
    pub opposite_trade_window: chrono::Duration,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            orders_window: chrono::Duration::seconds(10),
            cancel_window: chrono::Duration::seconds(5),
            opposite_trade_window: chrono::Duration::seconds(2),
        }
    }
}

impl DetectionConfig {
    pub fn new(
        orders_window: chrono::Duration,
        cancel_window: chrono::Duration,
        opposite_trade_window: chrono::Duration,
    ) -> Result<Self, SurveillanceError> {
        require_positive_duration(orders_window, "orders_window")?;
        require_positive_duration(cancel_window, "cancel_window")?;
        require_positive_duration(opposite_trade_window, "opposite_trade_window")?;
        Ok(Self {
            orders_window,
            cancel_window,
            opposite_trade_window,
        })
    }
}

/// Thresholds for the wash-trading detector. All fields must be strictly
/// positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WashTradingConfig {
    pub min_buy_trades: u32,
    pub min_sell_trades: u32,
    pub min_alternation_percentage: f64,
    pub min_total_volume: u64,
    pub window_size: chrono::Duration,
    pub optional_price_change_threshold: f64,
}

impl Default for WashTradingConfig {
    fn default() -> Self {
        Self {
            min_buy_trades: 3,
            min_sell_trades: 3,
            min_alternation_percentage: 60.0,
            min_total_volume: 10_000,
            window_size: chrono::Duration::minutes(30),
            optional_price_change_threshold: 1.0,
        }
    }
}

impl WashTradingConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        min_buy_trades: u32,
        min_sell_trades: u32,
        min_alternation_percentage: f64,
        min_total_volume: u64,
        window_size: chrono::Duration,
        optional_price_change_threshold: f64,
    ) -> Result<Self, SurveillanceError> {
        require_positive_u32(min_buy_trades, "min_buy_trades")?;
        require_positive_u32(min_sell_trades, "min_sell_trades")?;
        require_positive_f64(min_alternation_percentage, "min_alternation_percentage")?;
        require_positive_u64(min_total_volume, "min_total_volume")?;
        require_positive_duration(window_size, "window_size")?;
        require_positive_f64(
            optional_price_change_threshold,
            "optional_price_change_threshold",
        )?;
        Ok(Self {
            min_buy_trades,
            min_sell_trades,
            min_alternation_percentage,
            min_total_volume,
            window_size,
            optional_price_change_threshold,
        })
    }
}

fn require_positive_duration(
    value: chrono::Duration,
    field: &'static str,
) -> Result<(), SurveillanceError> {
    if value <= chrono::Duration::zero() {
        return Err(SurveillanceError::ConfigInvalid {
            field,
            reason: "must be strictly positive".into(),
        });
    }
    Ok(())
}

fn require_positive_u32(value: u32, field: &'static str) -> Result<(), SurveillanceError> {
    if value == 0 {
        return Err(SurveillanceError::ConfigInvalid {
            field,
            reason: "must be strictly positive".into(),
        });
    }
    Ok(())
}

fn require_positive_u64(value: u64, field: &'static str) -> Result<(), SurveillanceError> {
    if value == 0 {
        return Err(SurveillanceError::ConfigInvalid {
            field,
            reason: "must be strictly positive".into(),
        });
    }
    Ok(())
}

fn require_positive_f64(value: f64, field: &'static str) -> Result<(), SurveillanceError> {
    if !(value > 0.0) {
        return Err(SurveillanceError::ConfigInvalid {
            field,
            reason: "must be strictly positive".into(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionType {
    Layering,
    WashTrading,
}

impl DetectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionType::Layering => "LAYERING",
            DetectionType::WashTrading => "WASH_TRADING",
        }
    }
}

/// A single detected suspicious sequence. Represented as a Rust enum rather
/// than the source's one-record-many-optional-fields shape: each variant
/// only carries the fields that are meaningful for it. CSV projection lives
/// in `crate::io::csv_output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "detection_type")]
pub enum SuspiciousSequence {
    #[serde(rename = "LAYERING")]
    Layering {
        account_id: String,
        product_id: String,
        start_timestamp: DateTime<Utc>,
        end_timestamp: DateTime<Utc>,
        total_buy_qty: u64,
        total_sell_qty: u64,
        side: Side,
        num_cancelled_orders: u32,
        order_timestamps: Vec<DateTime<Utc>>,
    },
    #[serde(rename = "WASH_TRADING")]
    WashTrading {
        account_id: String,
        product_id: String,
        start_timestamp: DateTime<Utc>,
        end_timestamp: DateTime<Utc>,
        total_buy_qty: u64,
        total_sell_qty: u64,
        alternation_percentage: f64,
        price_change_percentage: Option<f64>,
    },
}

impl SuspiciousSequence {
    pub fn account_id(&self) -> &str {
        match self {
            SuspiciousSequence::Layering { account_id, .. } => account_id,
            SuspiciousSequence::WashTrading { account_id, .. } => account_id,
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            SuspiciousSequence::Layering { product_id, .. } => product_id,
            SuspiciousSequence::WashTrading { product_id, .. } => product_id,
        }
    }

    pub fn start_timestamp(&self) -> DateTime<Utc> {
        match self {
            SuspiciousSequence::Layering { start_timestamp, .. } => *start_timestamp,
            SuspiciousSequence::WashTrading { start_timestamp, .. } => *start_timestamp,
        }
    }

    pub fn end_timestamp(&self) -> DateTime<Utc> {
        match self {
            SuspiciousSequence::Layering { end_timestamp, .. } => *end_timestamp,
            SuspiciousSequence::WashTrading { end_timestamp, .. } => *end_timestamp,
        }
    }

    pub fn detection_type(&self) -> DetectionType {
        match self {
            SuspiciousSequence::Layering { .. } => DetectionType::Layering,
            SuspiciousSequence::WashTrading { .. } => DetectionType::WashTrading,
        }
    }

    pub fn total_buy_qty(&self) -> u64 {
        match self {
            SuspiciousSequence::Layering { total_buy_qty, .. } => *total_buy_qty,
            SuspiciousSequence::WashTrading { total_buy_qty, .. } => *total_buy_qty,
        }
    }

    pub fn total_sell_qty(&self) -> u64 {
        match self {
            SuspiciousSequence::Layering { total_sell_qty, .. } => *total_sell_qty,
            SuspiciousSequence::WashTrading { total_sell_qty, .. } => *total_sell_qty,
        }
    }
}
