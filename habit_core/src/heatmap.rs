//! Calendar heatmap projection of habit logs.
//!
//! Projects log entries onto per-day cells for a month or a whole year.
//! Only days that actually have a log entry produce a point; renderers
//! treat missing days as absence, not as zero.

use crate::{Habit, HabitLogEntry, HeatmapPoint};
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

/// Project logs into heatmap points.
///
/// With `month` set the range is the first to last day of that month,
/// otherwise the full year. `habit_id` narrows the projection to a single
/// habit; ownership of that habit is the caller's concern. Points come back
/// ordered by date, `value` 1 for completed and 0 for missed.
pub fn project(
    habits: &[Habit],
    logs: &[HabitLogEntry],
    year: i32,
    month: Option<u32>,
    habit_id: Option<Uuid>,
) -> Vec<HeatmapPoint> {
    let Some((start, end)) = date_range(year, month) else {
        tracing::warn!(year, month, "unrepresentable heatmap range");
        return Vec::new();
    };

    let names: HashMap<Uuid, &str> = habits
        .iter()
        .map(|habit| (habit.id, habit.name.as_str()))
        .collect();

    let mut points: Vec<HeatmapPoint> = logs
        .iter()
        .filter(|entry| habit_id.map_or(true, |wanted| entry.habit_id == wanted))
        .filter(|entry| entry.date >= start && entry.date <= end)
        .filter_map(|entry| {
            let name = names.get(&entry.habit_id)?;
            Some(HeatmapPoint {
                date: entry.date,
                value: u8::from(entry.completed),
                habit_id: entry.habit_id,
                habit_name: (*name).to_string(),
            })
        })
        .collect();

    points.sort_by_key(|point| point.date);
    points
}

/// Inclusive range for a month of a year, or the whole year
fn date_range(year: i32, month: Option<u32>) -> Option<(NaiveDate, NaiveDate)> {
    match month {
        Some(m) => {
            let start = NaiveDate::from_ymd_opt(year, m, 1)?;
            let next_month = if m == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(year, m + 1, 1)
            }?;
            Some((start, next_month.pred_opt()?))
        }
        None => Some((
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecurrenceRule;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit(name: &str) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.into(),
            rule: RecurrenceRule::Everyday,
            start_date: date(2024, 1, 1),
            created_at: Utc::now(),
        }
    }

    fn log_entry(habit_id: Uuid, day: NaiveDate, completed: bool) -> HabitLogEntry {
        HabitLogEntry {
            id: Uuid::new_v4(),
            habit_id,
            date: day,
            completed,
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_logged_days_produce_points() {
        // Three logged days in a 30-day month -> exactly three points
        let reading = habit("Reading");
        let logs = vec![
            log_entry(reading.id, date(2024, 4, 3), true),
            log_entry(reading.id, date(2024, 4, 11), false),
            log_entry(reading.id, date(2024, 4, 28), true),
        ];

        let points = project(std::slice::from_ref(&reading), &logs, 2024, Some(4), None);

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].value, 1);
        assert_eq!(points[1].value, 0);
        assert_eq!(points[0].habit_name, "Reading");
    }

    #[test]
    fn test_month_range_excludes_neighbouring_months() {
        let reading = habit("Reading");
        let logs = vec![
            log_entry(reading.id, date(2024, 3, 31), true),
            log_entry(reading.id, date(2024, 4, 1), true),
            log_entry(reading.id, date(2024, 4, 30), true),
            log_entry(reading.id, date(2024, 5, 1), true),
        ];

        let points = project(std::slice::from_ref(&reading), &logs, 2024, Some(4), None);

        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2024, 4, 1), date(2024, 4, 30)]);
    }

    #[test]
    fn test_december_range_reaches_the_31st() {
        let reading = habit("Reading");
        let logs = vec![
            log_entry(reading.id, date(2024, 12, 31), true),
            log_entry(reading.id, date(2025, 1, 1), true),
        ];

        let points = project(std::slice::from_ref(&reading), &logs, 2024, Some(12), None);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, date(2024, 12, 31));
    }

    #[test]
    fn test_year_range_spans_all_months() {
        let reading = habit("Reading");
        let logs = vec![
            log_entry(reading.id, date(2023, 12, 31), true),
            log_entry(reading.id, date(2024, 1, 1), true),
            log_entry(reading.id, date(2024, 7, 15), true),
            log_entry(reading.id, date(2024, 12, 31), true),
            log_entry(reading.id, date(2025, 1, 1), true),
        ];

        let points = project(std::slice::from_ref(&reading), &logs, 2024, None, None);
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn test_habit_filter() {
        let reading = habit("Reading");
        let running = habit("Running");
        let habits = vec![reading.clone(), running.clone()];
        let logs = vec![
            log_entry(reading.id, date(2024, 4, 3), true),
            log_entry(running.id, date(2024, 4, 3), true),
        ];

        let points = project(&habits, &logs, 2024, Some(4), Some(running.id));

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].habit_id, running.id);
        assert_eq!(points[0].habit_name, "Running");
    }

    #[test]
    fn test_entry_for_unknown_habit_is_skipped() {
        let reading = habit("Reading");
        let logs = vec![log_entry(Uuid::new_v4(), date(2024, 4, 3), true)];

        let points = project(std::slice::from_ref(&reading), &logs, 2024, Some(4), None);
        assert!(points.is_empty());
    }

    #[test]
    fn test_unrepresentable_month_yields_no_points() {
        let reading = habit("Reading");
        let logs = vec![log_entry(reading.id, date(2024, 4, 3), true)];

        let points = project(std::slice::from_ref(&reading), &logs, 2024, Some(13), None);
        assert!(points.is_empty());
    }
}
