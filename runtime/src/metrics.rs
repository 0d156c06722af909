//! Prometheus metrics for observability and monitoring.
//!
//! Metrics are emitted through the `metrics` facade by the storage layer and
//! the HTTP transport:
//! - Repository operations (count by outcome, latency)
//! - Storage rollbacks
//! - HTTP requests (count by status, latency)
//!
//! The server installs the Prometheus recorder once and serves the rendered
//! text from `/metrics`.
//!
//! # Example
//!
//! ```rust,no_run
//! use todokv_runtime::metrics;
//!
//! # fn example() -> Result<(), metrics::MetricsError> {
//! let handle = metrics::install_recorder()?;
//! println!("{}", handle.render());
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusRecorder};
use std::time::Duration;
use thiserror::Error;
use todokv_core::telemetry::{
    REPOSITORY_OPERATION_DURATION_SECONDS, REPOSITORY_OPERATIONS_TOTAL, STORAGE_ROLLBACKS_TOTAL,
};

pub use metrics_exporter_prometheus::PrometheusHandle;

/// Counter of HTTP requests, labelled by `method` and `status`.
pub const HTTP_REQUESTS_TOTAL: &str = "todokv_http_requests_total";

/// Histogram of HTTP request latency, labelled by `method`.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "todokv_http_request_duration_seconds";

/// Latency buckets shared by every `*_duration_seconds` histogram.
const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

fn builder() -> Result<PrometheusBuilder, MetricsError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| MetricsError::Build(e.to_string()))
}

/// Installs the Prometheus recorder as the global recorder.
///
/// # Errors
///
/// Returns `MetricsError::Install` if a global recorder is already installed.
/// Call this once per process.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    let handle = builder()?
        .install_recorder()
        .map_err(|e| MetricsError::Install(e.to_string()))?;
    describe_metrics();
    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

/// Builds a recorder without installing it globally.
///
/// Pair it with [`metrics::with_local_recorder`] in tests.
///
/// # Errors
///
/// Returns `MetricsError::Build` if the exporter configuration is rejected.
pub fn local_recorder() -> Result<PrometheusRecorder, MetricsError> {
    Ok(builder()?.build_recorder())
}

/// Register all metric descriptions.
pub fn describe_metrics() {
    describe_counter!(
        REPOSITORY_OPERATIONS_TOTAL,
        "Total number of repository operations by operation and outcome"
    );
    describe_histogram!(
        REPOSITORY_OPERATION_DURATION_SECONDS,
        "Time taken by repository operations"
    );
    describe_counter!(
        STORAGE_ROLLBACKS_TOTAL,
        "Total number of storage write transactions rolled back"
    );
    describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests by method and status"
    );
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "Time taken to serve HTTP requests"
    );
}

/// HTTP metrics recorder.
pub struct HttpMetrics;

impl HttpMetrics {
    /// Record a served request.
    pub fn record_request(method: &str, status: u16, duration: Duration) {
        counter!(
            HTTP_REQUESTS_TOTAL,
            "method" => method.to_owned(),
            "status" => status.to_string()
        )
        .increment(1);
        histogram!(HTTP_REQUEST_DURATION_SECONDS, "method" => method.to_owned())
            .record(duration.as_secs_f64());
    }
}
