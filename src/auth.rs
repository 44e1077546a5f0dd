//! `X-API-Key` header authentication middleware.
//!
//! Grounded in the teacher's `auth/middleware.rs` (`AuthError` enum with a
//! manual `IntoResponse` impl); restyled around `crate::domain::SurveillanceError`
//! rather than a separate auth-only error type, and around a single static
//! key (`original_source/services/wash-trading-service/config.py::get_api_key`)
//! instead of JWT — this system authenticates coordinator→worker/aggregator
//! service calls, not end users.

use axum::body::Body;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::SurveillanceError;

pub const API_KEY_HEADER: &str = "x-api-key";

fn extract_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER)?.to_str().ok()
}

/// Validates the `X-API-Key` header against `expected_key`. When
/// `expected_key` is `None`, authentication is disabled — matches
/// `get_api_key`'s "unset means development mode" contract.
pub async fn require_api_key(
    expected_key: Option<String>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, SurveillanceError> {
    let Some(expected_key) = expected_key else {
        return Ok(next.run(request).await);
    };

    match extract_key(request.headers()) {
        None => Err(SurveillanceError::AuthMissingKey),
        Some(provided) if provided == expected_key => Ok(next.run(request).await),
        Some(_) => Err(SurveillanceError::AuthInvalidKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(expected_key: Option<String>) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(move |req, next| {
                require_api_key(expected_key.clone(), req, next)
            }))
    }

    #[tokio::test]
    async fn disabled_when_no_key_configured() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(None).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app(Some("secret".into())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_key_is_rejected() {
        let request = Request::builder()
            .uri("/")
            .header("x-api-key", "wrong")
            .body(Body::empty())
            .unwrap();
        let response = app(Some("secret".into())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn correct_key_passes_through() {
        let request = Request::builder()
            .uri("/")
            .header("x-api-key", "secret")
            .body(Body::empty())
            .unwrap();
        let response = app(Some("secret".into())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
