//! Watch registration handler.
//!
//! - `POST /api/v1/watches` - Validate a watch and start polling it
//!
//! Validation runs in a fixed order (body, url, interval, pattern) and stops
//! at the first failure. A watch that passes validation is scheduled
//! immediately; its first check runs one interval later.

use crate::errors::WatchError;
use crate::models::{
    RegisterWatchRequest, RegisterWatchResponse, WatchTask, MAX_INTERVAL_SECONDS,
    MIN_INTERVAL_SECONDS,
};
use crate::routes::AppState;
use crate::services::pattern::PatternSpec;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

/// Handler for POST /api/v1/watches
///
/// # Response
///
/// - 200 OK: Watch scheduled
/// - 400 Bad Request: Malformed body, or invalid url, interval or pattern
#[instrument(skip_all, name = "watch.handlers.register_watch")]
pub async fn register_watch(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterWatchRequest>, JsonRejection>,
) -> Result<Json<RegisterWatchResponse>, WatchError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(
            target: "watch.handlers.watches",
            error = %rejection.body_text(),
            "Rejected malformed watch request"
        );
        WatchError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    validate_url(&request.url)?;
    let interval = validate_interval(request.interval)?;
    let pattern = validate_pattern(&request.pattern)?;

    let task = WatchTask::new(request.url, pattern, interval);
    let response = RegisterWatchResponse {
        id: task.id,
        url: task.url.clone(),
        pattern: task.pattern.as_str().to_string(),
        pattern_kind: task.pattern.kind(),
        interval: request.interval,
    };

    info!(
        target: "watch.handlers.watches",
        task_id = %task.id,
        url = %task.url,
        pattern_kind = task.pattern.kind().as_str(),
        interval_seconds = request.interval,
        "Registered watch"
    );

    state.scheduler.schedule(task);

    Ok(Json(response))
}

/// Accept only absolute http(s) URLs.
fn validate_url(raw: &str) -> Result<(), WatchError> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => {
            warn!(target: "watch.handlers.watches", url = %raw, "Rejected watch: invalid url");
            Err(WatchError::BadRequest("Invalid url".to_string()))
        }
    }
}

/// Intervals outside `MIN_INTERVAL_SECONDS..=MAX_INTERVAL_SECONDS` are rejected.
fn validate_interval(seconds: i64) -> Result<Duration, WatchError> {
    if !(MIN_INTERVAL_SECONDS..=MAX_INTERVAL_SECONDS).contains(&seconds) {
        warn!(
            target: "watch.handlers.watches",
            interval_seconds = seconds,
            "Rejected watch: invalid interval"
        );
        return Err(WatchError::BadRequest("Invalid interval".to_string()));
    }

    Ok(Duration::from_secs(seconds.unsigned_abs()))
}

/// Empty patterns and regex patterns that fail to compile are rejected.
fn validate_pattern(raw: &str) -> Result<PatternSpec, WatchError> {
    if raw.is_empty() {
        warn!(target: "watch.handlers.watches", "Rejected watch: empty pattern");
        return Err(WatchError::BadRequest("Invalid pattern".to_string()));
    }

    PatternSpec::parse(raw).map_err(|e| {
        warn!(
            target: "watch.handlers.watches",
            error = %e,
            "Rejected watch: invalid pattern"
        );
        WatchError::BadRequest("Invalid pattern".to_string())
    })
}
