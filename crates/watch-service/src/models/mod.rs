//! Watch Service models.
//!
//! Contains the watch task record, check outcomes, and the API request and
//! response bodies.

use crate::errors::CheckError;
use crate::services::pattern::{PatternKind, PatternSpec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Minimum poll interval accepted at registration, in seconds.
pub const MIN_INTERVAL_SECONDS: i64 = 1;

/// Maximum poll interval accepted at registration, in seconds (30 days).
pub const MAX_INTERVAL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// A registered watch: poll `url` every `interval` and look for `pattern`.
///
/// Immutable once created. Inputs are validated by the intake handler before
/// a task is constructed.
#[derive(Debug, Clone)]
pub struct WatchTask {
    /// Identifier used in logs and returned to the client.
    pub id: Uuid,

    /// Absolute http(s) URL to poll.
    pub url: String,

    /// Classified pattern.
    pub pattern: PatternSpec,

    /// Time between polls.
    pub interval: Duration,
}

impl WatchTask {
    pub fn new(url: impl Into<String>, pattern: PatternSpec, interval: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            pattern,
            interval,
        }
    }
}

/// A match handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub url: String,
    pub pattern: String,
    pub matched_text: String,
}

/// Stored match row.
#[derive(Debug, Clone)]
pub struct StoredMatch {
    pub id: i64,
    pub url: String,
    pub pattern: String,
    pub data: String,
    pub matched_at: DateTime<Utc>,
}

/// Result of one fetch-and-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The pattern matched; holds the recorded text.
    Matched(String),

    /// The body was fetched and searched, nothing matched. Not an error.
    NoMatch,

    /// The check failed.
    Failed(CheckError),
}

impl CheckOutcome {
    /// Bounded label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Matched(_) => "matched",
            CheckOutcome::NoMatch => "no_match",
            CheckOutcome::Failed(e) => e.kind(),
        }
    }
}

impl From<Result<Option<String>, CheckError>> for CheckOutcome {
    fn from(result: Result<Option<String>, CheckError>) -> Self {
        match result {
            Ok(Some(text)) => CheckOutcome::Matched(text),
            Ok(None) => CheckOutcome::NoMatch,
            Err(e) => CheckOutcome::Failed(e),
        }
    }
}

/// Health check response.
///
/// Returned by the `/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy" or "unhealthy").
    pub status: String,

    /// Database connectivity status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Request body for `POST /api/v1/watches`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWatchRequest {
    /// URL to poll.
    pub url: String,

    /// Poll interval in seconds.
    pub interval: i64,

    /// Literal or regex pattern.
    pub pattern: String,
}

/// Response body for a registered watch.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterWatchResponse {
    pub id: Uuid,
    pub url: String,
    pub pattern: String,
    pub pattern_kind: PatternKind,
    pub interval: i64,
}
