//! Request body size limit middleware.
//!
//! Grounded in `original_source/services/shared/request_limits.py`
//! (`RequestSizeLimitMiddleware`), restyled as an `axum::middleware::from_fn`
//! function in the shape of the teacher's `middleware/rate_limit.rs`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Clone, Copy)]
pub struct RequestSizeLimit {
    pub max_bytes: u64,
}

impl Default for RequestSizeLimit {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Serialize)]
struct TooLargeBody {
    detail: String,
}

/// Rejects requests whose `Content-Length` header exceeds `limit.max_bytes`
/// with 413. A missing or unparsable header is let through — the request
/// fails normally at body-parsing time if it turns out to be oversized.
pub async fn enforce_request_size_limit(
    limit: RequestSizeLimit,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(content_length) = request
        .headers()
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
    {
        if content_length > limit.max_bytes {
            let mb = limit.max_bytes as f64 / (1024.0 * 1024.0);
            let body = TooLargeBody {
                detail: format!("Request body too large. Maximum size: {mb:.1}MB"),
            };
            return (StatusCode::PAYLOAD_TOO_LARGE, axum::Json(body)).into_response();
        }
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(limit: RequestSizeLimit) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(move |req, next| {
                enforce_request_size_limit(limit, req, next)
            }))
    }

    #[tokio::test]
    async fn oversized_content_length_is_rejected() {
        let limit = RequestSizeLimit { max_bytes: 100 };
        let request = Request::builder()
            .uri("/")
            .header("content-length", "1000")
            .body(Body::empty())
            .unwrap();
        let response = app(limit).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn within_limit_passes_through() {
        let limit = RequestSizeLimit { max_bytes: 100 };
        let request = Request::builder()
            .uri("/")
            .header("content-length", "10")
            .body(Body::empty())
            .unwrap();
        let response = app(limit).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
