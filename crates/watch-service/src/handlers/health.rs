//! Health check handler.
//!
//! `/health` always answers 200 and reports database reachability in the
//! body, so a probe can tell a running process from a usable one.

use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// Handler for GET /health
#[tracing::instrument(skip_all, name = "watch.health")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_check = sqlx::query("SELECT 1").fetch_one(&state.pool).await;

    let (status, database) = match db_check {
        Ok(_) => ("healthy", "healthy"),
        Err(e) => {
            // Log actual error server-side for operators
            tracing::warn!(target: "watch.health", error = %e, "Health check failed: database error");
            ("unhealthy", "unhealthy")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        database: Some(database.to_string()),
    })
}
