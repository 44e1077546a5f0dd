//! Coordinator binary.
//!
//! Serves `POST /orchestrate` by default. Given a positional input file
//! name it instead runs a single pipeline invocation directly against the
//! already-configured worker/aggregator URLs and exits with the CLI status
//! code spec.md 6 describes (`0` success, `1` any failure) — the thin CLI
//! shim `original_source/main.py` played, now backed by the distributed
//! pipeline instead of an in-process call.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware as axum_mw;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use layering_surveillance::config::PipelineConfig;
use layering_surveillance::coordinator::{router, run_orchestration, CoordinatorState};
use layering_surveillance::request_limits::{enforce_request_size_limit, RequestSizeLimit};

#[derive(Parser, Debug)]
#[command(name = "coordinator")]
#[command(about = "Layering/wash-trading surveillance coordinator")]
struct Args {
    /// Input file name (resolved inside INPUT_DIR). When given, runs one
    /// pipeline invocation directly instead of starting the HTTP server.
    input_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let args = Args::parse();
    let config = PipelineConfig::from_env().context("loading coordinator configuration")?;

    match args.input_file {
        Some(input_file) => run_once(config, &input_file).await,
        None => serve(config).await,
    }
}

async fn run_once(config: PipelineConfig, input_file: &str) -> Result<()> {
    let state = CoordinatorState::new(config);
    match run_orchestration(&state, input_file).await {
        Ok(response) => {
            info!(
                request_id = %response.request_id,
                total_sequences = response.total_sequences,
                partial = response.partial,
                "pipeline invocation complete"
            );
            if response.partial && !response.services_failed.is_empty() {
                error!(failed = ?response.services_failed, "one or more services failed");
                std::process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "pipeline invocation failed");
            std::process::exit(1);
        }
    }
}

async fn serve(config: PipelineConfig) -> Result<()> {
    let bind_addr: SocketAddr = config
        .coordinator_bind_addr
        .parse()
        .context("invalid COORDINATOR_BIND_ADDR")?;
    let api_key = config.api_key.clone();
    let size_limit = RequestSizeLimit {
        max_bytes: config.max_request_body_bytes,
    };

    let state = Arc::new(CoordinatorState::new(config));

    let app = router(state, api_key)
        .layer(axum_mw::from_fn(move |req, next| {
            enforce_request_size_limit(size_limit, req, next)
        }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "coordinator listening");
    axum::serve(listener, app).await.context("coordinator server error")
}
