//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use super::run_service;
use crate::error::AppError;
use crate::middleware::RequestId;
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use todokv_runtime::metrics::PrometheusHandle;

/// Body of the health endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// `ok`, `ready` or `not_ready`
    pub status: &'static str,
}

/// Liveness probe.
///
/// Returns 200 as long as the process serves requests. Does NOT touch the store.
///
/// # Endpoint
///
/// ```text
/// GET /healthz
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "ok"
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn healthz() -> (StatusCode, Json<HealthStatus>) {
    (StatusCode::OK, Json(HealthStatus { status: "ok" }))
}

/// Readiness probe: the store answers a full listing within the ready timeout.
///
/// # Status Codes
///
/// - 200 OK: `{"status":"ready"}`
/// - 503 Service Unavailable: `{"status":"not_ready"}`
///
/// # Endpoint
///
/// ```text
/// GET /readyz
/// ```
pub async fn readyz(
    State(state): State<AppState>,
    request_id: RequestId,
) -> (StatusCode, Json<HealthStatus>) {
    match run_service(&state, state.ready_timeout(), |service, ctx| service.ready(ctx)).await {
        Ok(()) => (StatusCode::OK, Json(HealthStatus { status: "ready" })),
        Err(err) => {
            tracing::warn!(%request_id, error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus { status: "not_ready" }),
            )
        }
    }
}

/// Prometheus scrape endpoint.
///
/// Returns 404 when the server runs without a metrics recorder.
///
/// # Errors
///
/// `NOT_FOUND` if metrics are disabled.
#[allow(clippy::unused_async)]
pub async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state
        .metrics()
        .map(PrometheusHandle::render)
        .ok_or_else(|| AppError::not_found("metrics are not enabled"))
}
