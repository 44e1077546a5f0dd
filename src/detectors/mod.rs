//! Detection algorithm plugin interface and concrete detectors.
//!
//! Grounded in `original_source/src/layering_detection/algorithms/base.py`
//! (`DetectionAlgorithm` ABC). The Python base class also carries a
//! `run_from_volume` convenience method for standalone CLI use; that
//! concern lives in `crate::io` and the `coordinator` binary here instead
//! of on the trait, since Rust's I/O layer doesn't need a trait default.

pub mod layering;
pub mod wash_trading;

use crate::domain::model::{SuspiciousSequence, TransactionEvent};
use crate::domain::SurveillanceError;

/// A pluggable detection algorithm, registered by name at process startup.
///
/// Implementations must be stateless with respect to a single `detect`
/// call — the coordinator/worker split runs one call per grouped batch of
/// events, never interleaved calls sharing mutable state.
pub trait DetectionAlgorithm: Send + Sync {
    /// Unique identifier, e.g. `"layering"`. Must be unique across the
    /// registry; enforced at registration time, not here.
    fn name(&self) -> &'static str;

    /// Human-readable summary of what this algorithm flags.
    fn description(&self) -> &'static str;

    /// Preprocessing hook run before `detect`. Default keeps every event;
    /// override to narrow to the event types the algorithm cares about.
    fn filter_events(&self, events: &[TransactionEvent]) -> Vec<TransactionEvent> {
        events.to_vec()
    }

    /// Core detection pass over already-filtered events.
    fn detect(&self, events: &[TransactionEvent]) -> Result<Vec<SuspiciousSequence>, SurveillanceError>;
}

pub use layering::LayeringAlgorithm;
pub use wash_trading::WashTradingAlgorithm;
