#![forbid(unsafe_code)]

//! Core domain model and analytics for the habit tracker.
//!
//! This crate provides:
//! - Domain types (habits, recurrence rules, log entries)
//! - Recurrence evaluation ("is this habit due today?")
//! - Streak and dashboard analytics as pure functions over in-memory logs
//! - Local persistence (habit store, log journal, CSV archive, config)
//!
//! The analytics modules (`recurrence`, `streak`, `aggregate`, `heatmap`)
//! never touch storage; callers fetch habits and logs first and pass them
//! in, so results are recomputed from the full input on every call.

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod recurrence;
pub mod streak;
pub mod aggregate;
pub mod heatmap;
pub mod journal;
pub mod store;
pub mod export;
pub mod history;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, Theme};
pub use recurrence::{due_status, is_due, DueStatus};
pub use streak::compute_streaks;
pub use aggregate::{build_stats, Period};
pub use heatmap::project;
pub use journal::{JsonlJournal, LogSink};
pub use store::HabitStore;
pub use history::{load_log_history, logs_by_habit};
