//! Match store.
//!
//! `MatchStore` is the persistence seam used by the checker. It is shared by
//! every watch and every in-flight check, so implementations must accept
//! concurrent calls. The checker adds no locking of its own.

use crate::errors::WatchError;
use crate::repositories::MatchesRepository;
use sqlx::SqlitePool;

/// Persists matches found by checks.
#[async_trait::async_trait]
pub trait MatchStore: Send + Sync {
    /// Record one match.
    async fn save(&self, url: &str, pattern: &str, matched_text: &str) -> Result<(), WatchError>;
}

/// SQLite-backed match store.
#[derive(Clone)]
pub struct SqliteMatchStore {
    pool: SqlitePool,
}

impl SqliteMatchStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MatchStore for SqliteMatchStore {
    async fn save(&self, url: &str, pattern: &str, matched_text: &str) -> Result<(), WatchError> {
        MatchesRepository::insert_match(&self.pool, url, pattern, matched_text).await?;
        Ok(())
    }
}

/// Mock match store for testing.
pub mod mock {
    use super::*;
    use crate::models::MatchRecord;
    use std::sync::Mutex;

    /// Records every save; optionally fails them.
    #[derive(Default)]
    pub struct MockMatchStore {
        saves: Mutex<Vec<MatchRecord>>,
        failure: Option<String>,
    }

    impl MockMatchStore {
        /// Create a store that accepts every save.
        pub fn accepting() -> Self {
            Self::default()
        }

        /// Create a store that rejects every save with `message`.
        pub fn failing(message: &str) -> Self {
            Self {
                saves: Mutex::new(Vec::new()),
                failure: Some(message.to_string()),
            }
        }

        /// Saves attempted so far, including rejected ones.
        pub fn saves(&self) -> Vec<MatchRecord> {
            self.saves
                .lock()
                .map(|saves| saves.clone())
                .unwrap_or_default()
        }

        pub fn save_count(&self) -> usize {
            self.saves.lock().map(|saves| saves.len()).unwrap_or(0)
        }
    }

    #[async_trait::async_trait]
    impl MatchStore for MockMatchStore {
        async fn save(
            &self,
            url: &str,
            pattern: &str,
            matched_text: &str,
        ) -> Result<(), WatchError> {
            if let Ok(mut saves) = self.saves.lock() {
                saves.push(MatchRecord {
                    url: url.to_string(),
                    pattern: pattern.to_string(),
                    matched_text: matched_text.to_string(),
                });
            }

            match &self.failure {
                Some(message) => Err(WatchError::Database(message.clone())),
                None => Ok(()),
            }
        }
    }
}
