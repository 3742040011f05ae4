//! Fetch-and-check operation.
//!
//! One check fetches the watched URL, searches the body for the task's
//! pattern, and saves any match to the store.
//!
//! # Timeout
//!
//! The fetch (request and full body read) runs under the check timeout. When
//! the timeout elapses the fetch future is dropped, which aborts the request
//! and releases its connection. Nothing keeps running in the background and
//! no late result is ever delivered.
//!
//! Matching and the store write happen after the fetch and are not covered by
//! the timeout; the store is expected to bound its own latency.

use crate::errors::{CheckError, WatchError};
use crate::models::{CheckOutcome, WatchTask};
use crate::observability::record_check;
use crate::services::store::MatchStore;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

/// Runs one check for a task.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, task: &WatchTask) -> CheckOutcome;
}

/// HTTP checker backed by `reqwest`.
#[derive(Clone)]
pub struct UrlChecker {
    client: Client,
    store: Arc<dyn MatchStore>,
    check_timeout: Duration,
}

impl UrlChecker {
    /// Create a new checker.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::Internal` if the HTTP client cannot be built.
    pub fn new(store: Arc<dyn MatchStore>, check_timeout: Duration) -> Result<Self, WatchError> {
        let client = Client::builder().build().map_err(|e| {
            error!(target: "watch.services.checker", error = %e, "Failed to build HTTP client");
            WatchError::Internal
        })?;

        Ok(Self {
            client,
            store,
            check_timeout,
        })
    }

    async fn run_check(&self, task: &WatchTask) -> Result<Option<String>, CheckError> {
        let (body, content_type) = tokio::time::timeout(self.check_timeout, self.fetch(&task.url))
            .await
            .map_err(|_| CheckError::Timeout(self.check_timeout))??;

        let Some(matched) = task.pattern.find_match(&body, content_type.as_deref())? else {
            debug!(target: "watch.services.checker", "No match found for pattern");
            return Ok(None);
        };

        self.store
            .save(&task.url, task.pattern.as_str(), &matched)
            .await
            .map_err(|e| CheckError::Persistence(e.to_string()))?;

        info!(
            target: "watch.services.checker",
            pattern_kind = task.pattern.kind().as_str(),
            "Matched pattern and saved match"
        );

        Ok(Some(matched))
    }

    /// GET `url` and read the whole body.
    async fn fetch(&self, url: &str) -> Result<(Vec<u8>, Option<String>), CheckError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| CheckError::Fetch(e.to_string()))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| CheckError::Fetch(format!("failed to read response body: {e}")))?;

        Ok((body.to_vec(), content_type))
    }
}

#[async_trait::async_trait]
impl Checker for UrlChecker {
    #[instrument(skip_all, name = "watch.check", fields(task_id = %task.id, url = %task.url))]
    async fn check(&self, task: &WatchTask) -> CheckOutcome {
        let start = Instant::now();
        let outcome = CheckOutcome::from(self.run_check(task).await);
        record_check(outcome.label(), start.elapsed());
        outcome
    }
}

/// Mock checker for testing the scheduler.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed outcome after an optional delay and tracks concurrency.
    pub struct MockChecker {
        outcome: CheckOutcome,
        delay: Duration,
        call_count: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockChecker {
        /// Create a mock that immediately returns `outcome`.
        pub fn returning(outcome: CheckOutcome) -> Self {
            Self::with_delay(outcome, Duration::ZERO)
        }

        /// Create a mock that returns `outcome` after `delay`.
        pub fn with_delay(outcome: CheckOutcome, delay: Duration) -> Self {
            Self {
                outcome,
                delay,
                call_count: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        /// Number of checks started.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Highest number of checks observed running at the same time.
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Checker for MockChecker {
        async fn check(&self, _task: &WatchTask) -> CheckOutcome {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(running, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }
}
