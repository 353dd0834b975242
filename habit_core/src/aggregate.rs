//! Dashboard aggregation: summary counters, per-day series, top habits.
//!
//! All computation is over in-memory collections supplied by the caller;
//! nothing here reads storage or caches results.

use crate::{streak, DailyBucket, Habit, HabitLogEntry, StatsReport, StatsSummary, TopHabit};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use uuid::Uuid;

/// Habits returned in the top-habits ranking
const TOP_HABITS_LIMIT: usize = 5;

/// Reporting window for dashboard statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Period {
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    /// Inclusive `[start, end]` range of trailing days ending on `today`
    pub fn range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let days_back = match self {
            Period::Week => 6,
            Period::Month => 29,
            Period::Year => 364,
        };
        (today - Duration::days(days_back), today)
    }
}

/// Aggregate a user's habits and logs into a dashboard report.
///
/// The daily series holds one zero-initialized bucket per calendar day from
/// `start_date` to `end_date` inclusive; in-range log entries increment the
/// matching bucket. Top habits are ranked by longest streak over each
/// habit's *full* history with `end_date` as the reference, descending,
/// ties kept in input order.
pub fn build_stats(
    habits: &[Habit],
    logs_by_habit: &HashMap<Uuid, Vec<HabitLogEntry>>,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> StatsReport {
    let mut daily_series = Vec::new();
    let mut day = start_date;
    while day <= end_date {
        daily_series.push(DailyBucket {
            date: day,
            completed: 0,
            missed: 0,
            total: 0,
        });
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    let mut total_completions = 0u32;
    let mut total_missed = 0u32;

    for habit in habits {
        let Some(logs) = logs_by_habit.get(&habit.id) else {
            continue;
        };
        for log_entry in logs {
            if log_entry.date < start_date || log_entry.date > end_date {
                continue;
            }
            let index = log_entry.date.signed_duration_since(start_date).num_days() as usize;
            let bucket = &mut daily_series[index];
            bucket.total += 1;
            if log_entry.completed {
                bucket.completed += 1;
                total_completions += 1;
            } else {
                bucket.missed += 1;
                total_missed += 1;
            }
        }
    }

    let denominator = total_completions + total_missed;
    let completion_rate = if denominator == 0 {
        0
    } else {
        (f64::from(total_completions) * 100.0 / f64::from(denominator)).round() as u32
    };

    let mut ranked: Vec<TopHabit> = habits
        .iter()
        .map(|habit| {
            let logs = logs_by_habit
                .get(&habit.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let streaks = streak::compute_streaks(logs, end_date);
            TopHabit {
                id: habit.id,
                name: habit.name.clone(),
                longest_streak: streaks.longest_streak,
            }
        })
        .collect();
    // Stable sort keeps input order between equal streaks.
    ranked.sort_by(|a, b| b.longest_streak.cmp(&a.longest_streak));
    ranked.truncate(TOP_HABITS_LIMIT);

    StatsReport {
        summary: StatsSummary {
            total_habits: habits.len() as u32,
            total_completions,
            total_missed,
            completion_rate,
        },
        daily_series,
        top_habits: ranked,
    }
}
