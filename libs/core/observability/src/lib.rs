//! Observability utilities for the book chat service.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Chat pipeline metrics (requests by outcome, chunks returned, stage latency)
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, ChatMetrics, ChatOutcome};
//!
//! init_metrics()?;
//!
//! ChatMetrics::record_request(ChatOutcome::Answered, 5);
//!
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod chat;
pub mod middleware;

pub use chat::{ChatMetrics, ChatOutcome, Stage, StageTimer};
pub use middleware::metrics_middleware;

pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Idempotent: later calls return the handle installed by the first one.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Chat metrics
    describe_counter!(
        "chat_requests_total",
        "Chat requests by outcome (answered, exhausted, invalid, failed)"
    );
    describe_histogram!(
        "chat_chunks_returned",
        "Number of chunks returned per answered chat request"
    );
    describe_histogram!(
        "embedding_duration_seconds",
        "Embedding provider call duration in seconds"
    );
    describe_histogram!(
        "retrieval_duration_seconds",
        "Nearest-neighbor query duration in seconds"
    );
}
