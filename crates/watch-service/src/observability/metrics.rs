//! Metrics definitions for Watch Service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `watch_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `outcome`: 6 values (matched, no_match, timeout, fetch_error,
//!   invalid_json, persistence_error)
//! - `method`: 7 values max
//! - `endpoint`: known routes, everything else is `/other`
//! - `status`: 3 values (success, error, timeout)
//!
//! Watched URLs are never used as labels.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("watch_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Checks are bounded by the check timeout (max 300s)
        .set_buckets_for_metric(
            Matcher::Prefix("watch_check".to_string()),
            &[
                0.010, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000, 30.000, 60.000,
            ],
        )
        .map_err(|e| format!("Failed to set check buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Check Metrics
// ============================================================================

/// Record a completed check.
///
/// Metric: `watch_checks_total`, `watch_check_duration_seconds`
/// Labels: `outcome`
pub fn record_check(outcome: &'static str, duration: Duration) {
    histogram!("watch_check_duration_seconds",
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());

    counter!("watch_checks_total",
        "outcome" => outcome
    )
    .increment(1);
}

/// Set the number of running watch loops.
///
/// Metric: `watch_tasks_active`
pub fn set_tasks_active(count: usize) {
    gauge!("watch_tasks_active").set(count as f64);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `watch_http_requests_total`, `watch_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("watch_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("watch_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path to a bounded label.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/v1/watches" => "/api/v1/watches",
        _ => "/other",
    }
}
