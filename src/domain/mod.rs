//! Event model, grouping, and fingerprinting — the C1 component.

pub mod error;
pub mod fingerprint;
pub mod grouper;
pub mod model;

pub use error::SurveillanceError;
pub use model::{
    DetectionConfig, DetectionType, EventType, GroupKey, Side, SuspiciousSequence,
    TransactionEvent, WashTradingConfig,
};
