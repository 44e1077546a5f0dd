//! Coordinator service: the fan-out/fan-in entry point for a single
//! detection run.
//!
//! Grounded in `original_source/main.py`/`orchestrator.py` for the overall
//! read -> detect -> write shape, generalized per spec.md 4.5.1 into a
//! distributed read -> fan-out -> fan-in over HTTP to the worker and
//! aggregator services. There is no `original_source` HTTP body to port
//! (the Python reference ran detection in-process); the route shape
//! follows spec.md and the teacher's axum `Router`/`Arc<State>`/`reqwest::Client`
//! idiom (`scrapers/dome_rest.rs`).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Client;
use reqwest::StatusCode;

use crate::auth::require_api_key;
use crate::config::PipelineConfig;
use crate::domain::{fingerprint, SurveillanceError};
use crate::io::csv_input;
use crate::path_validation::validate_input_path;
use crate::retry::{retry_with_backoff, RetryOutcome};
use crate::wire::{
    AggregateRequest, AggregateResponse, DetectRequest, DetectResponse, HealthResponse,
    OrchestrateRequest, OrchestrateResponse, ServiceResult,
};

pub struct CoordinatorState {
    pub config: PipelineConfig,
    pub http: Client,
}

impl CoordinatorState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }
}

/// `/orchestrate` requires `X-API-Key` when `api_key` is configured;
/// `/health` and `/` stay public per spec.md 6.
pub fn router(state: Arc<CoordinatorState>, api_key: Option<String>) -> Router {
    let protected = Router::new()
        .route("/orchestrate", post(orchestrate))
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
    "layering-surveillance coordinator"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn orchestrate(
    State(state): State<Arc<CoordinatorState>>,
    Json(request): Json<OrchestrateRequest>,
) -> Result<Json<OrchestrateResponse>, SurveillanceError> {
    let response = run_orchestration(&state, &request.input_file).await?;
    Ok(Json(response))
}

/// One call to a single worker target, interpreted into the retry loop's
/// tri-state contract: `Ok(Some(_))` success, `Ok(None)` retryable failure,
/// `Err(_)` permanent failure that aborts the retry sequence immediately.
async fn call_worker_once(
    http: &Client,
    url: &str,
    body: &DetectRequest,
    per_attempt_timeout: Duration,
) -> Result<Option<DetectResponse>, SurveillanceError> {
    let endpoint = format!("{}/detect", url.trim_end_matches('/'));
    let result = http
        .post(&endpoint)
        .timeout(per_attempt_timeout)
        .json(body)
        .send()
        .await;

    let response = match result {
        Ok(r) => r,
        Err(e) if e.is_timeout() => {
            tracing::warn!(%endpoint, "worker call timed out, retrying");
            return Ok(None);
        }
        Err(e) => {
            tracing::warn!(%endpoint, error = %e, "worker call failed, retrying");
            return Ok(None);
        }
    };

    let status = response.status();
    if status.is_success() {
        let parsed = response
            .json::<DetectResponse>()
            .await
            .map_err(|e| SurveillanceError::ValidationFailed { reason: e.to_string() })?;
        return Ok(Some(parsed));
    }

    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        tracing::warn!(%endpoint, %status, "worker returned retryable status");
        return Ok(None);
    }

    Err(SurveillanceError::ValidationFailed {
        reason: format!("worker {endpoint} returned non-retryable status {status}"),
    })
}

/// Retries one worker target to exhaustion, producing the aggregator-facing
/// `ServiceResult` either way — a permanently-failed or exhausted target
/// never aborts the other targets' dispatch.
async fn dispatch_to_worker(
    http: Client,
    service: String,
    url: String,
    body: DetectRequest,
    config: PipelineConfig,
) -> ServiceResult {
    let per_attempt_timeout = Duration::from_secs(config.per_attempt_timeout_secs);
    let outcome = retry_with_backoff(config.backoff, |_attempt| {
        let http = http.clone();
        let url = url.clone();
        let body = body.clone();
        async move { call_worker_once(&http, &url, &body, per_attempt_timeout).await }
    })
    .await;

    match outcome {
        Ok(RetryOutcome::Succeeded { value, .. }) => ServiceResult {
            service,
            succeeded: true,
            sequences: value.sequences,
        },
        Ok(RetryOutcome::Exhausted { attempts }) => {
            tracing::error!(service = %service, attempts, "worker target exhausted retries");
            ServiceResult {
                service,
                succeeded: false,
                sequences: Vec::new(),
            }
        }
        Err(e) => {
            tracing::error!(service = %service, error = %e, "worker target failed permanently");
            ServiceResult {
                service,
                succeeded: false,
                sequences: Vec::new(),
            }
        }
    }
}

/// Runs one full pipeline invocation: validate, read, fingerprint, fan out
/// to every configured worker target concurrently, fan in to the
/// aggregator. The whole fan-out is bounded by `global_deadline_secs`; a
/// deadline that elapses drops every still-outstanding target to failed.
pub async fn run_orchestration(
    state: &CoordinatorState,
    input_file: &str,
) -> Result<OrchestrateResponse, SurveillanceError> {
    let path = validate_input_path(input_file, &state.config.input_dir)?;
    let events = csv_input::read_transactions(&path)?;

    let request_id = fingerprint::generate_request_id();
    let event_fingerprint = fingerprint::fingerprint(&events);

    let expected_services: Vec<String> = state.config.worker_urls.keys().cloned().collect();

    let dispatches = state.config.worker_urls.iter().map(|(name, url)| {
        let body = DetectRequest {
            request_id: request_id.clone(),
            event_fingerprint: event_fingerprint.clone(),
            algorithm: name.clone(),
            events: events.clone(),
        };
        dispatch_to_worker(state.http.clone(), name.clone(), url.clone(), body, state.config.clone())
    });

    let global_deadline = Duration::from_secs(state.config.global_deadline_secs);
    let results: Vec<ServiceResult> = match tokio::time::timeout(
        global_deadline,
        futures_util::future::join_all(dispatches),
    )
    .await
    {
        Ok(results) => results,
        Err(_) => {
            tracing::error!(%request_id, "global deadline elapsed before all workers completed");
            expected_services
                .iter()
                .map(|service| ServiceResult {
                    service: service.clone(),
                    succeeded: false,
                    sequences: Vec::new(),
                })
                .collect()
        }
    };

    let services_completed: Vec<String> = results
        .iter()
        .filter(|r| r.succeeded)
        .map(|r| r.service.clone())
        .collect();
    let services_failed: Vec<String> = results
        .iter()
        .filter(|r| !r.succeeded)
        .map(|r| r.service.clone())
        .collect();

    let aggregate_request = AggregateRequest {
        request_id: request_id.clone(),
        expected_services: expected_services.clone(),
        results,
        allow_partial_results: state.config.allow_partial_results,
    };

    let endpoint = format!("{}/aggregate", state.config.aggregator_url.trim_end_matches('/'));
    let aggregate_response = state
        .http
        .post(&endpoint)
        .json(&aggregate_request)
        .send()
        .await
        .map_err(|e| SurveillanceError::ValidationFailed { reason: format!("aggregator call failed: {e}") })?;

    if !aggregate_response.status().is_success() {
        let status = aggregate_response.status();
        let text = aggregate_response.text().await.unwrap_or_default();
        return Err(SurveillanceError::ValidationFailed {
            reason: format!("aggregator rejected request ({status}): {text}"),
        });
    }

    let aggregated: AggregateResponse = aggregate_response
        .json()
        .await
        .map_err(|e| SurveillanceError::ValidationFailed { reason: e.to_string() })?;

    Ok(OrchestrateResponse {
        request_id,
        event_fingerprint,
        total_sequences: aggregated.total_sequences,
        services_completed,
        services_failed,
        partial: aggregated.partial,
    })
}
