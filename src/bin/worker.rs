//! Worker binary.
//!
//! Serves `POST /detect` for every algorithm registered in the bootstrap
//! registry, guarded by the worker-local idempotency cache. One worker
//! process can back any number of the coordinator's configured algorithm
//! endpoints; `WORKER_BIND_ADDR` picks which one a given deployment
//! answers for.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware as axum_mw;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use layering_surveillance::config::PipelineConfig;
use layering_surveillance::registry;
use layering_surveillance::request_limits::{enforce_request_size_limit, RequestSizeLimit};
use layering_surveillance::worker::{router, WorkerState};

const DEFAULT_CACHE_CAPACITY: usize = 1000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = PipelineConfig::from_env().context("loading worker configuration")?;
    let bind_addr: SocketAddr = config
        .worker_bind_addr
        .parse()
        .context("invalid WORKER_BIND_ADDR")?;
    let api_key = config.api_key.clone();
    let size_limit = RequestSizeLimit {
        max_bytes: config.max_request_body_bytes,
    };

    let cache_capacity = std::env::var("IDEMPOTENCY_CACHE_CAPACITY")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CACHE_CAPACITY);

    let state = Arc::new(WorkerState::new(registry::bootstrap(), cache_capacity));

    let app = router(state, api_key)
        .layer(axum_mw::from_fn(move |req, next| {
            enforce_request_size_limit(size_limit, req, next)
        }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, cache_capacity, "worker listening");
    axum::serve(listener, app).await.context("worker server error")
}
