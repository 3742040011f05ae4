//! Watch registration integration tests.
//!
//! Exercises `POST /api/v1/watches` through the real router: validation
//! order, error bodies, and that an accepted watch is actually polled.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use sqlx::SqlitePool;
use std::time::Duration;
use watch_service::models::MAX_INTERVAL_SECONDS;
use watch_service::repositories::MatchesRepository;
use watch_test_utils::TestWatchServer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn post_watch(
    server: &TestWatchServer,
    body: serde_json::Value,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/api/v1/watches", server.url()))
        .json(&body)
        .send()
        .await?)
}

async fn assert_bad_request(response: reqwest::Response, expected_message: &str) {
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["message"], expected_message);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_register_literal_watch(pool: SqlitePool) -> Result<(), anyhow::Error> {
    let server = TestWatchServer::spawn(pool).await?;

    let response = post_watch(
        &server,
        json!({"url": "https://example.com/data", "interval": 60, "pattern": "value"}),
    )
    .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["url"], "https://example.com/data");
    assert_eq!(body["pattern"], "value");
    assert_eq!(body["pattern_kind"], "literal");
    assert_eq!(body["interval"], 60);
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));

    assert_eq!(server.scheduler().active_count(), 1);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_register_regex_watch(pool: SqlitePool) -> Result<(), anyhow::Error> {
    let server = TestWatchServer::spawn(pool).await?;

    let response = post_watch(
        &server,
        json!({"url": "http://example.com", "interval": 1, "pattern": "^xyz\\d+$"}),
    )
    .await?;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["pattern_kind"], "regex");

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_invalid_url_rejected(pool: SqlitePool) -> Result<(), anyhow::Error> {
    let server = TestWatchServer::spawn(pool).await?;

    for url in ["not a url", "ftp://example.com/file", "/relative"] {
        let response = post_watch(
            &server,
            json!({"url": url, "interval": 10, "pattern": "value"}),
        )
        .await?;
        assert_bad_request(response, "Invalid url").await;
    }

    assert_eq!(server.scheduler().active_count(), 0);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_invalid_interval_rejected(pool: SqlitePool) -> Result<(), anyhow::Error> {
    let server = TestWatchServer::spawn(pool).await?;

    for interval in [0, -1, MAX_INTERVAL_SECONDS + 1, i64::MAX] {
        let response = post_watch(
            &server,
            json!({"url": "https://example.com", "interval": interval, "pattern": "value"}),
        )
        .await?;
        assert_bad_request(response, "Invalid interval").await;
    }

    assert_eq!(server.scheduler().active_count(), 0);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_invalid_pattern_rejected(pool: SqlitePool) -> Result<(), anyhow::Error> {
    let server = TestWatchServer::spawn(pool).await?;

    for pattern in ["", "^(unclosed"] {
        let response = post_watch(
            &server,
            json!({"url": "https://example.com", "interval": 10, "pattern": pattern}),
        )
        .await?;
        assert_bad_request(response, "Invalid pattern").await;
    }

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_url_checked_before_interval_and_pattern(
    pool: SqlitePool,
) -> Result<(), anyhow::Error> {
    let server = TestWatchServer::spawn(pool).await?;

    let response = post_watch(
        &server,
        json!({"url": "nope", "interval": 0, "pattern": ""}),
    )
    .await?;
    assert_bad_request(response, "Invalid url").await;

    let response = post_watch(
        &server,
        json!({"url": "https://example.com", "interval": 0, "pattern": ""}),
    )
    .await?;
    assert_bad_request(response, "Invalid interval").await;

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_malformed_body_rejected(pool: SqlitePool) -> Result<(), anyhow::Error> {
    let server = TestWatchServer::spawn(pool).await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/v1/watches", server.url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    // Missing field
    let response = post_watch(&server, json!({"url": "https://example.com"})).await?;
    assert_eq!(response.status(), 400);

    // Wrong type
    let response = post_watch(
        &server,
        json!({"url": "https://example.com", "interval": "ten", "pattern": "x"}),
    )
    .await?;
    assert_eq!(response.status(), 400);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_registered_watch_records_match(pool: SqlitePool) -> Result<(), anyhow::Error> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "service": {"state": "degraded-value"}
        })))
        .mount(&upstream)
        .await;

    let server = TestWatchServer::spawn(pool).await?;
    let watched_url = format!("{}/status", upstream.uri());

    let response = post_watch(
        &server,
        json!({"url": watched_url, "interval": 1, "pattern": "value"}),
    )
    .await?;
    assert_eq!(response.status(), 200);

    // First tick fires after one interval
    let mut stored = Vec::new();
    for _ in 0..40 {
        stored = MatchesRepository::list_by_url(server.pool(), &watched_url).await?;
        if !stored.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let first = stored.first().expect("watch should have recorded a match");
    assert_eq!(first.pattern, "value");
    assert_eq!(first.data, "degraded-value");

    Ok(())
}
