//! Worker service: runs one registered detection algorithm per request.
//!
//! There is no `original_source` HTTP body to port from (the Python
//! reference only shipped `wash-trading-service/config.py`, not its FastAPI
//! route handlers) — this module's shape follows spec.md's worker contract,
//! built with the teacher's axum `Router`/shared-`Arc<State>` idiom
//! (`main.rs`'s server setup).

use std::sync::Arc;

use axum::extract::State;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::auth::require_api_key;
use crate::cache::{CacheKey, IdempotencyCache};
use crate::domain::SurveillanceError;
use crate::registry::AlgorithmRegistry;
use crate::wire::{DetectRequest, DetectResponse, HealthResponse};

pub struct WorkerState {
    pub registry: AlgorithmRegistry,
    pub cache: IdempotencyCache,
}

impl WorkerState {
    pub fn new(registry: AlgorithmRegistry, cache_capacity: usize) -> Self {
        Self {
            registry,
            cache: IdempotencyCache::new(cache_capacity),
        }
    }
}

/// `/detect` requires `X-API-Key` when `api_key` is configured; `/health`
/// and `/` stay public per spec.md 6.
pub fn router(state: Arc<WorkerState>, api_key: Option<String>) -> Router {
    let protected = Router::new()
        .route("/detect", post(detect))
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
    "layering-surveillance worker"
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

async fn detect(
    State(state): State<Arc<WorkerState>>,
    Json(request): Json<DetectRequest>,
) -> Result<Json<DetectResponse>, SurveillanceError> {
    let key = CacheKey {
        request_id: request.request_id.clone(),
        fingerprint: request.event_fingerprint.clone(),
    };

    if let Some(sequences) = state.cache.get(&key) {
        return Ok(Json(DetectResponse {
            request_id: request.request_id,
            algorithm: request.algorithm,
            sequences,
            cache_hit: true,
        }));
    }

    let algorithm = state.registry.get(&request.algorithm)?;
    let filtered = algorithm.filter_events(&request.events);
    let sequences = algorithm.detect(&filtered)?;

    state.cache.put(key, sequences.clone());

    Ok(Json(DetectResponse {
        request_id: request.request_id,
        algorithm: request.algorithm,
        sequences,
        cache_hit: false,
    }))
}
