//! Background tasks for Watch Service.
//!
//! # Tasks
//!
//! - `scheduler` - One polling loop per registered watch

pub mod scheduler;

pub use scheduler::{start_watch_scheduler, WatchScheduler};
