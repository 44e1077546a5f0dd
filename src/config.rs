//! Process configuration, loaded from the environment in the teacher's
//! `Config::from_env()` style (`models.rs`): `env::var(...).unwrap_or_else`
//! with a string default, then parsed, falling back again on parse failure.
//!
//! Directory/flag defaults are grounded in
//! `original_source/services/aggregator-service/config.py` and
//! `original_source/services/wash-trading-service/config.py`; retry/backoff
//! and per-service URL knobs are this crate's own orchestration-layer
//! additions (no original_source equivalent — the Python reference never
//! shipped the HTTP service bodies, only their config helpers).

use std::collections::BTreeMap;

use crate::retry::BackoffConfig;

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Shared pipeline configuration read by all three binaries. Each binary
/// only consults the fields relevant to its role.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub logs_dir: String,

    /// If unset, API-key authentication is disabled (development only) —
    /// matches `wash-trading-service/config.py::get_api_key`.
    pub api_key: Option<String>,

    pub validation_strict: bool,
    pub allow_partial_results: bool,

    pub pseudonymization_salt: Option<String>,

    /// Algorithm name -> worker base URL. One entry per enabled algorithm
    /// endpoint the coordinator fans out to (spec.md's "per-service URLs
    /// for inter-service targets").
    pub worker_urls: BTreeMap<String, String>,
    pub aggregator_url: String,

    pub max_request_body_bytes: u64,
    pub per_attempt_timeout_secs: u64,
    pub global_deadline_secs: u64,

    pub backoff: BackoffConfig,

    pub coordinator_bind_addr: String,
    pub worker_bind_addr: String,
    pub aggregator_bind_addr: String,
}

impl PipelineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let input_dir = env_string("INPUT_DIR", "/app/input");
        let output_dir = env_string("OUTPUT_DIR", "/app/output");
        let logs_dir = env_string("LOGS_DIR", "/app/logs");

        let api_key = std::env::var("API_KEY").ok().filter(|v| !v.is_empty());

        let validation_strict = env_bool("VALIDATION_STRICT", true);
        let allow_partial_results = env_bool("ALLOW_PARTIAL_RESULTS", false);

        let pseudonymization_salt = std::env::var("PSEUDONYMIZATION_SALT")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let worker_urls = BTreeMap::from([
            ("layering".to_string(), env_string("LAYERING_WORKER_URL", "http://localhost:8001")),
            (
                "wash_trading".to_string(),
                env_string("WASH_TRADING_WORKER_URL", "http://localhost:8002"),
            ),
        ]);

        let aggregator_url = env_string("AGGREGATOR_URL", "http://localhost:8003");

        let max_request_body_bytes = env_parsed("MAX_REQUEST_BODY_BYTES", 10 * 1024 * 1024);
        let per_attempt_timeout_secs = env_parsed("PER_ATTEMPT_TIMEOUT_SECS", 30);
        let global_deadline_secs = env_parsed("GLOBAL_DEADLINE_SECS", 120);

        let backoff = BackoffConfig {
            base_ms: env_parsed("BACKOFF_BASE_MS", 100),
            max_ms: env_parsed("BACKOFF_MAX_MS", 30_000),
            multiplier: env_parsed("BACKOFF_MULTIPLIER", 2.0),
            jitter_factor: env_parsed("BACKOFF_JITTER_FACTOR", 0.3),
            max_attempts: env_parsed("BACKOFF_MAX_ATTEMPTS", 3),
        };

        let coordinator_bind_addr = env_string("COORDINATOR_BIND_ADDR", "0.0.0.0:8000");
        let worker_bind_addr = env_string("WORKER_BIND_ADDR", "0.0.0.0:8001");
        let aggregator_bind_addr = env_string("AGGREGATOR_BIND_ADDR", "0.0.0.0:8003");

        Ok(Self {
            input_dir,
            output_dir,
            logs_dir,
            api_key,
            validation_strict,
            allow_partial_results,
            pseudonymization_salt,
            worker_urls,
            aggregator_url,
            max_request_body_bytes,
            per_attempt_timeout_secs,
            global_deadline_secs,
            backoff,
            coordinator_bind_addr,
            worker_bind_addr,
            aggregator_bind_addr,
        })
    }
}
