//! Aggregator binary.
//!
//! Serves `POST /aggregate`: validates completeness across the coordinator's
//! declared `expected_services`, merges sequences, and writes the canonical
//! `suspicious_accounts.csv` / `detections.csv` outputs.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware as axum_mw;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use layering_surveillance::aggregator::{router, AggregatorState};
use layering_surveillance::config::PipelineConfig;
use layering_surveillance::request_limits::{enforce_request_size_limit, RequestSizeLimit};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = PipelineConfig::from_env().context("loading aggregator configuration")?;
    let bind_addr: SocketAddr = config
        .aggregator_bind_addr
        .parse()
        .context("invalid AGGREGATOR_BIND_ADDR")?;
    let api_key = config.api_key.clone();
    let size_limit = RequestSizeLimit {
        max_bytes: config.max_request_body_bytes,
    };

    let state = Arc::new(AggregatorState { config });

    let app = router(state, api_key)
        .layer(axum_mw::from_fn(move |req, next| {
            enforce_request_size_limit(size_limit, req, next)
        }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "aggregator listening");
    axum::serve(listener, app).await.context("aggregator server error")
}
