//! Repository layer for Watch Service.
//!
//! Provides database access following the Handler -> Service -> Repository
//! architecture.

pub mod matches;

pub use matches::MatchesRepository;
