//! Prometheus metrics endpoint handler.
//!
//! Unauthenticated; labels carry only bounded operational values, never
//! watched URLs or patterns.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE watch_checks_total counter
/// watch_checks_total{outcome="matched"} 3
/// ```
#[tracing::instrument(skip_all, name = "watch.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
