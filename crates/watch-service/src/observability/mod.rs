//! Observability for Watch Service: Prometheus metrics.

pub mod metrics;

pub use metrics::{init_metrics_recorder, record_check, record_http_request, set_tasks_active};
