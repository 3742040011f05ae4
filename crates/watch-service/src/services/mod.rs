//! Service layer for Watch Service.
//!
//! # Components
//!
//! - `pattern` - Pattern classification and body matching
//! - `checker` - Timeout-bounded fetch-and-check of a watched URL
//! - `store` - Match persistence seam and its SQLite implementation

pub mod checker;
pub mod pattern;
pub mod store;

pub use checker::{Checker, UrlChecker};
pub use pattern::{PatternError, PatternKind, PatternSpec};
pub use store::{MatchStore, SqliteMatchStore};
