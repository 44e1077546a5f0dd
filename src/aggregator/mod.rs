//! Aggregator service: merges per-worker detection results and validates
//! completeness before writing the canonical CSV outputs.
//!
//! Completeness semantics (`allow_partial_results`) are grounded in
//! `original_source/services/aggregator-service/config.py::get_allow_partial_results`.
//! There is no original HTTP handler to port — the route shape follows
//! spec.md and the teacher's axum `Router`/`Arc<State>` idiom.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::require_api_key;
use crate::config::PipelineConfig;
use crate::domain::model::SuspiciousSequence;
use crate::domain::SurveillanceError;
use crate::io::csv_output;
use crate::wire::{AggregateRequest, AggregateResponse, HealthResponse};

pub struct AggregatorState {
    pub config: PipelineConfig,
}

/// `/aggregate` requires `X-API-Key` when `api_key` is configured; `/health`
/// and `/` stay public per spec.md 6.
pub fn router(state: Arc<AggregatorState>, api_key: Option<String>) -> Router {
    let protected = Router::new()
        .route("/aggregate", post(aggregate))
        .route_layer(axum_mw::from_fn(move |req, next| {
            require_api_key(api_key.clone(), req, next)
        }));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}

async fn root() -> &'static str {
    "layering-surveillance aggregator"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Returns which of `expected_services` have no corresponding successful
/// entry in `results` — the completeness check spec.md requires before a
/// merge is considered whole.
pub fn missing_services(expected: &[String], results: &[crate::wire::ServiceResult]) -> Vec<String> {
    let succeeded: BTreeSet<&str> = results
        .iter()
        .filter(|r| r.succeeded)
        .map(|r| r.service.as_str())
        .collect();
    expected
        .iter()
        .filter(|svc| !succeeded.contains(svc.as_str()))
        .cloned()
        .collect()
}

/// Rejects a results list with a duplicate `service` entry or an entry for
/// a service name outside `expected_services` — both are distinct failure
/// modes from a merely-missing service.
pub fn validate_result_shape(
    expected: &[String],
    results: &[crate::wire::ServiceResult],
) -> Result<(), SurveillanceError> {
    let expected_set: BTreeSet<&str> = expected.iter().map(|s| s.as_str()).collect();
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for result in results {
        if !expected_set.contains(result.service.as_str()) {
            return Err(SurveillanceError::ValidationFailed {
                reason: format!("unknown service in results: {}", result.service),
            });
        }
        if !seen.insert(result.service.as_str()) {
            return Err(SurveillanceError::ValidationFailed {
                reason: format!("duplicate service entry: {}", result.service),
            });
        }
    }
    Ok(())
}

pub fn merge_sequences(results: &[crate::wire::ServiceResult]) -> Vec<SuspiciousSequence> {
    results
        .iter()
        .filter(|r| r.succeeded)
        .flat_map(|r| r.sequences.clone())
        .collect()
}

async fn aggregate(
    State(state): State<Arc<AggregatorState>>,
    Json(request): Json<AggregateRequest>,
) -> Result<Json<AggregateResponse>, SurveillanceError> {
    validate_result_shape(&request.expected_services, &request.results)?;

    let missing = missing_services(&request.expected_services, &request.results);
    let partial = !missing.is_empty();

    if partial && !request.allow_partial_results {
        return Err(SurveillanceError::ValidationFailed {
            reason: format!("missing results from services: {missing:?}"),
        });
    }

    let sequences = merge_sequences(&request.results);

    let accounts_path = PathBuf::from(&state.config.output_dir).join("suspicious_accounts.csv");
    csv_output::write_suspicious_accounts(&accounts_path, &sequences)?;

    let detections_path = PathBuf::from(&state.config.logs_dir).join("detections.csv");
    let salt = state.config.pseudonymization_salt.as_deref();
    csv_output::write_detection_logs(&detections_path, &sequences, salt.is_some(), salt)?;

    Ok(Json(AggregateResponse {
        request_id: request.request_id,
        total_sequences: sequences.len(),
        partial,
        missing_services: missing,
    }))
}
