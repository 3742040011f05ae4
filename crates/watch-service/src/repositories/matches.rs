//! Matches repository for database operations.
//!
//! Append-only storage of pattern matches. Each successful check inserts its
//! own row, so concurrent checks for the same URL never contend on a row.
//!
//! # Security
//!
//! - All queries use parameterized statements (SQL injection safe)
//! - Matched body text is not logged

use crate::errors::WatchError;
use crate::models::StoredMatch;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

/// Repository for match records.
pub struct MatchesRepository;

impl MatchesRepository {
    /// Insert a match.
    ///
    /// Returns the id of the new row.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn insert_match(
        pool: &SqlitePool,
        url: &str,
        pattern: &str,
        data: &str,
    ) -> Result<i64, WatchError> {
        let result = sqlx::query(
            r#"
            INSERT INTO matches (url, pattern, data, matched_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(url)
        .bind(pattern)
        .bind(data)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// List matches recorded for a URL, oldest first.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn list_by_url(pool: &SqlitePool, url: &str) -> Result<Vec<StoredMatch>, WatchError> {
        let rows: Vec<MatchRow> = sqlx::query_as(
            r#"
            SELECT id, url, pattern, data, matched_at
            FROM matches
            WHERE url = $1
            ORDER BY id ASC
            "#,
        )
        .bind(url)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(StoredMatch::from).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MatchRow {
    id: i64,
    url: String,
    pattern: String,
    data: String,
    matched_at: DateTime<Utc>,
}

impl From<MatchRow> for StoredMatch {
    fn from(row: MatchRow) -> Self {
        StoredMatch {
            id: row.id,
            url: row.url,
            pattern: row.pattern,
            data: row.data,
            matched_at: row.matched_at,
        }
    }
}

/// Integration tests for the matches repository requiring database.
#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod integration_tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_insert_match_creates_row(pool: SqlitePool) {
        let id = MatchesRepository::insert_match(
            &pool,
            "http://example.com",
            "testpattern",
            "testdata",
        )
        .await
        .expect("insert should succeed");

        let (count,): (i64,) = sqlx::query_as(
            "SELECT count(*) FROM matches WHERE url = $1 AND pattern = $2 AND data = $3",
        )
        .bind("http://example.com")
        .bind("testpattern")
        .bind("testdata")
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(count, 1);
        assert!(id > 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_list_by_url_filters_and_orders(pool: SqlitePool) {
        MatchesRepository::insert_match(&pool, "http://a.example", "p", "first")
            .await
            .unwrap();
        MatchesRepository::insert_match(&pool, "http://b.example", "p", "other")
            .await
            .unwrap();
        MatchesRepository::insert_match(&pool, "http://a.example", "p", "second")
            .await
            .unwrap();

        let rows = MatchesRepository::list_by_url(&pool, "http://a.example")
            .await
            .unwrap();

        let data: Vec<&str> = rows.iter().map(|r| r.data.as_str()).collect();
        assert_eq!(data, vec!["first", "second"]);
        assert!(rows.iter().all(|r| r.url == "http://a.example"));
        assert!(rows.iter().all(|r| r.matched_at <= Utc::now()));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_duplicate_matches_are_appended(pool: SqlitePool) {
        for _ in 0..3 {
            MatchesRepository::insert_match(&pool, "http://dup.example", "p", "same")
                .await
                .unwrap();
        }

        let rows = MatchesRepository::list_by_url(&pool, "http://dup.example")
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }
}
