//! Streak computation over a habit's daily log history.
//!
//! Completed days chain when exactly one calendar day apart. The current
//! streak is the trailing run touching the reference date, with a single
//! day of grace: a run ending yesterday still counts because today may
//! simply not be logged yet. One day older than that and it has lapsed.

use crate::{HabitLogEntry, StreakResult};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Compute current and longest streaks for one habit's logs.
///
/// Input order does not matter; entries are sorted by date internally, so
/// permuting the input yields identical output. An empty log set yields
/// `{0, 0}`.
pub fn compute_streaks(logs: &[HabitLogEntry], reference: NaiveDate) -> StreakResult {
    if logs.is_empty() {
        return StreakResult::default();
    }

    let mut sorted: Vec<&HabitLogEntry> = logs.iter().collect();
    sorted.sort_by_key(|entry| entry.date);

    let longest = longest_run(&sorted);
    let current = trailing_run(&sorted, reference);

    StreakResult {
        current_streak: current,
        // A live run longer than anything historical is the new longest.
        longest_streak: longest.max(current),
    }
}

/// Longest run of consecutive completed days anywhere in the history
fn longest_run(sorted: &[&HabitLogEntry]) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut last_counted: Option<NaiveDate> = None;

    for entry in sorted {
        if !entry.completed {
            run = 0;
            last_counted = None;
            continue;
        }

        run = match last_counted {
            Some(prev) if prev.succ_opt() == Some(entry.date) => run + 1,
            // First completed day, a gap, or a duplicate date: restart at 1.
            _ => 1,
        };
        longest = longest.max(run);
        last_counted = Some(entry.date);
    }

    longest
}

/// Trailing run ending at or one day before `reference`
fn trailing_run(sorted: &[&HabitLogEntry], reference: NaiveDate) -> u32 {
    let Some(most_recent) = sorted.iter().rev().find(|entry| entry.date <= reference) else {
        return 0;
    };

    if !most_recent.completed {
        return 0;
    }

    // Live only while the run touches the reference date or the grace day
    // immediately before it.
    if reference.signed_duration_since(most_recent.date).num_days() > 1 {
        return 0;
    }

    let completed_dates: HashSet<NaiveDate> = sorted
        .iter()
        .filter(|entry| entry.completed)
        .map(|entry| entry.date)
        .collect();

    let mut streak = 1u32;
    let mut day = most_recent.date;
    while let Some(prev) = day.pred_opt() {
        if !completed_dates.contains(&prev) {
            break;
        }
        streak += 1;
        day = prev;
    }

    streak
}
