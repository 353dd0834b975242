//! Core domain types for the habit tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Habits and their recurrence rules
//! - Daily completion log entries
//! - Derived analytics results (streaks, daily buckets, heatmap points)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

// ============================================================================
// Habit Types
// ============================================================================

/// When a habit is scheduled to be performed.
///
/// Custom days are weekday indices 0-6 with 0 = Sunday. The rule is decoded
/// into this variant once at the input boundary (see
/// [`RecurrenceRule::from_parts`](crate::recurrence)) and never re-parsed
/// during evaluation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum RecurrenceRule {
    Everyday,
    Weekdays,
    Custom(BTreeSet<u8>),
}

/// A recurring habit owned by a user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub rule: RecurrenceRule,
    /// The habit is never due before this date
    pub start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Log Types
// ============================================================================

/// One day's completion record for a habit.
///
/// The journal is append-only, so several raw entries may exist for the same
/// `(habit_id, date)`; the latest `logged_at` wins when history is loaded
/// (re-logging a day overwrites, it does not append).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HabitLogEntry {
    pub id: Uuid,
    pub habit_id: Uuid,
    /// Calendar date with no time-of-day component
    pub date: NaiveDate,
    pub completed: bool,
    pub logged_at: DateTime<Utc>,
}

// ============================================================================
// Analytics Result Types
// ============================================================================

/// Current and longest consecutive-completion streaks for one habit.
///
/// Invariant: `longest_streak >= current_streak`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakResult {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Per-day completion counters for the dashboard time series.
///
/// Every calendar day of the requested range gets a bucket, including days
/// with no log entries (`total == 0`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub completed: u32,
    pub missed: u32,
    pub total: u32,
}

/// One cell of a calendar heatmap.
///
/// Emitted only for days that have a log entry; days without one produce no
/// point (absence, not zero).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeatmapPoint {
    pub date: NaiveDate,
    /// 1 if the entry was completed, 0 if missed
    pub value: u8,
    pub habit_id: Uuid,
    pub habit_name: String,
}

/// Aggregate counters over a stats period
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSummary {
    pub total_habits: u32,
    pub total_completions: u32,
    pub total_missed: u32,
    /// Whole percent, 0 when there are no in-range entries
    pub completion_rate: u32,
}

/// A habit ranked by its longest streak
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopHabit {
    pub id: Uuid,
    pub name: String,
    pub longest_streak: u32,
}

/// Full dashboard statistics payload
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsReport {
    pub summary: StatsSummary,
    pub daily_series: Vec<DailyBucket>,
    pub top_habits: Vec<TopHabit>,
}
