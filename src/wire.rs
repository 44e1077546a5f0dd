//! Shared JSON wire types for the coordinator → worker → aggregator hop.
//!
//! No `original_source` file ships these HTTP bodies directly (the Python
//! reference only kept config/utility modules for the services, not their
//! endpoint bodies); shaped from spec.md's orchestration flow and the
//! teacher's plain `#[derive(Serialize, Deserialize)]` DTO style (e.g.
//! `models.rs`'s builder-style structs).

use serde::{Deserialize, Serialize};

use crate::domain::model::SuspiciousSequence;

/// `POST /orchestrate` request body: the coordinator's only required input
/// is which input file (inside `INPUT_DIR`) to run the pipeline over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrateRequest {
    pub input_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrateResponse {
    pub request_id: String,
    pub event_fingerprint: String,
    pub total_sequences: usize,
    pub services_completed: Vec<String>,
    pub services_failed: Vec<String>,
    pub partial: bool,
}

/// `POST /detect` request sent by the coordinator to a worker for one
/// registered algorithm's name and the grouped event batch it must run
/// against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    pub request_id: String,
    pub event_fingerprint: String,
    pub algorithm: String,
    pub events: Vec<crate::domain::model::TransactionEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub request_id: String,
    pub algorithm: String,
    pub sequences: Vec<SuspiciousSequence>,
    pub cache_hit: bool,
}

/// One worker's contribution, as seen by the aggregator: either its
/// sequences, or an explicit failure marker so completeness validation can
/// tell a missing result from an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResult {
    pub service: String,
    pub succeeded: bool,
    pub sequences: Vec<SuspiciousSequence>,
}

/// `POST /aggregate` request: everything the aggregator needs to validate
/// completeness and merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRequest {
    pub request_id: String,
    pub expected_services: Vec<String>,
    pub results: Vec<ServiceResult>,
    pub allow_partial_results: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub request_id: String,
    pub total_sequences: usize,
    pub partial: bool,
    pub missing_services: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok" }
    }
}
