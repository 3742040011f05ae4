//! # Watch Test Utilities
//!
//! Shared test utilities for Watch Service.
//!
//! This crate provides:
//! - Server test harness (`TestWatchServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use watch_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: SqlitePool) -> Result<()> {
//!     let server = TestWatchServer::spawn(pool).await?;
//!
//!     let response = reqwest::get(format!("{}/health", server.url())).await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;

pub use server_harness::*;
