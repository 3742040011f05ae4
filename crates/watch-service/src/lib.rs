//! Watch Service Library
//!
//! Polls registered URLs on a fixed interval and records every response that
//! matches the watch's pattern:
//!
//! - Pattern classification (literal or regex) and matching over plain text
//!   and JSON trees
//! - Timeout-bounded fetch-and-check of a single URL
//! - One repeating scheduler loop per registered watch
//! - SQLite-backed match store
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> tasks/scheduler.rs -> services/checker.rs
//!                                                          -> services/pattern.rs
//!                                                          -> services/store.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Data models
//! - `observability` - Prometheus metrics
//! - `repositories` - SQLite queries
//! - `routes` - Axum router setup
//! - `services` - Matching, checking and persistence seams
//! - `tasks` - Per-watch scheduler loops

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod tasks;
