//! HTTP request handlers for Watch Service.

pub mod health;
pub mod metrics;
pub mod watches;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use watches::register_watch;
