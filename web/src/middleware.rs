//! Axum middleware for request tracking and observability.
//!
//! # Flow
//!
//! 1. **Extract** the request id from the `X-Request-Id` header (or generate a UUID)
//! 2. **Store** it in request extensions for handler access
//! 3. **Create** an `http_request` tracing span carrying the id
//! 4. **Log** one line per request with status and latency, and record HTTP metrics
//! 5. **Inject** the id into the response `X-Request-Id` header
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use todokv_web::middleware::request_id_layer;
//!
//! let app = Router::new()
//!     .route("/todos", get(list_todos))
//!     .layer(request_id_layer());
//! ```

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderValue, Response},
};
use std::fmt;
use std::task::{Context, Poll};
use std::time::Instant;
use todokv_runtime::metrics::HttpMetrics;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for the request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Longest client-supplied request id that is kept.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Identifier of one HTTP request, stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Use the client's id if it is usable, otherwise generate one.
    #[must_use]
    pub fn from_header(value: Option<&HeaderValue>) -> Self {
        value
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
            .map_or_else(Self::generate, |s| Self(s.to_owned()))
    }

    /// A fresh UUID v4 request id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Create a layer that tags, logs and measures every request.
#[must_use]
pub const fn request_id_layer() -> RequestIdLayer {
    RequestIdLayer
}

/// Layer for request id tracking and request logging.
#[derive(Clone, Copy, Debug)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdMiddleware { inner }
    }
}

/// Middleware service for request id tracking and request logging.
#[derive(Clone, Debug)]
pub struct RequestIdMiddleware<S> {
    inner: S,
}

impl<S, B> Service<Request> for RequestIdMiddleware<S>
where
    S: Service<Request, Response = Response<B>> + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let request_id = RequestId::from_header(req.headers().get(REQUEST_ID_HEADER));
        let method = req.method().clone();
        let path = req
            .extensions()
            .get::<MatchedPath>()
            .map_or_else(|| req.uri().path().to_owned(), |p| p.as_str().to_owned());

        req.extensions_mut().insert(request_id.clone());

        let span = tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %method,
            path = %path,
        );

        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;
                let latency = started.elapsed();
                let status = response.status();

                tracing::info!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    request_id = %request_id,
                    "http_request"
                );
                HttpMetrics::record_request(method.as_str(), status.as_u16(), latency);

                if let Ok(header_value) = HeaderValue::from_str(request_id.as_str()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::{Extension, Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/test",
                get(|Extension(id): Extension<RequestId>| async move { id.to_string() }),
            )
            .layer(request_id_layer())
    }

    fn response_id(response: &axum::response::Response) -> String {
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .expect("Request id header should be present")
            .to_str()
            .unwrap()
            .to_owned()
    }

    #[tokio::test]
    async fn test_request_id_generated_if_missing() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert!(Uuid::parse_str(&response_id(&response)).is_ok());
    }

    #[tokio::test]
    async fn test_request_id_preserved_from_request() {
        let request = Request::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, "client-chosen-id")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response_id(&response), "client-chosen-id");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"client-chosen-id");
    }

    #[tokio::test]
    async fn test_oversized_request_id_is_replaced() {
        let oversized = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        let request = Request::builder()
            .uri("/test")
            .header(REQUEST_ID_HEADER, &oversized)
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        let id = response_id(&response);
        assert_ne!(id, oversized);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_from_header_rules() {
        assert_eq!(
            RequestId::from_header(Some(&HeaderValue::from_static("abc"))).as_str(),
            "abc"
        );
        let empty = RequestId::from_header(Some(&HeaderValue::from_static("")));
        assert!(Uuid::parse_str(empty.as_str()).is_ok());
        let max = "y".repeat(MAX_REQUEST_ID_LEN);
        let kept = RequestId::from_header(Some(&HeaderValue::from_str(&max).unwrap()));
        assert_eq!(kept.as_str(), max);
    }
}
