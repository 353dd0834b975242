//! Effective log history from journal and CSV archive.
//!
//! This module merges the active journal with previously rolled-up CSV
//! entries into the effective log set the analytics run on. Only one entry
//! per `(habit_id, date)` survives: the latest `logged_at` wins, so
//! re-logging a day overwrites rather than appends.

use crate::{Error, HabitLogEntry, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// CSV row format for reading archived log entries
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    habit_id: String,
    date: String,
    completed: bool,
    logged_at: String,
}

impl TryFrom<CsvRow> for HabitLogEntry {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;
        let habit_id = Uuid::parse_str(&row.habit_id)
            .map_err(|e| Error::Other(format!("Invalid habit UUID: {}", e)))?;

        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| Error::Date(format!("'{}': {}", row.date, e)))?;

        let logged_at = DateTime::parse_from_rfc3339(&row.logged_at)
            .map_err(|e| Error::Date(format!("'{}': {}", row.logged_at, e)))?
            .with_timezone(&Utc);

        Ok(HabitLogEntry {
            id,
            habit_id,
            date,
            completed: row.completed,
            logged_at,
        })
    }
}

/// Load the effective log set from the journal and the CSV archive.
///
/// Duplicate `(habit_id, date)` pairs collapse to the entry with the latest
/// `logged_at`; on an exact tie the journal entry wins over the archived
/// one. Returned sorted oldest first.
pub fn load_log_history(journal_path: &Path, csv_path: &Path) -> Result<Vec<HabitLogEntry>> {
    let mut effective: HashMap<(Uuid, NaiveDate), HabitLogEntry> = HashMap::new();

    // CSV archive first, then the journal, so ties favour the journal
    if csv_path.exists() {
        let archived = load_entries_from_csv(csv_path)?;
        let count = archived.len();
        for log_entry in archived {
            keep_latest(&mut effective, log_entry);
        }
        tracing::debug!("Loaded {} entries from CSV archive", count);
    }

    if journal_path.exists() {
        let journalled = crate::journal::read_entries(journal_path)?;
        let count = journalled.len();
        for log_entry in journalled {
            keep_latest(&mut effective, log_entry);
        }
        tracing::debug!("Loaded {} entries from journal", count);
    }

    let mut entries: Vec<HabitLogEntry> = effective.into_values().collect();
    entries.sort_by_key(|e| (e.date, e.habit_id));

    tracing::info!("Loaded {} effective log entries", entries.len());
    Ok(entries)
}

/// Group entries by habit id for per-habit computations
pub fn logs_by_habit(entries: Vec<HabitLogEntry>) -> HashMap<Uuid, Vec<HabitLogEntry>> {
    let mut grouped: HashMap<Uuid, Vec<HabitLogEntry>> = HashMap::new();
    for log_entry in entries {
        grouped.entry(log_entry.habit_id).or_default().push(log_entry);
    }
    grouped
}

fn keep_latest(
    effective: &mut HashMap<(Uuid, NaiveDate), HabitLogEntry>,
    log_entry: HabitLogEntry,
) {
    match effective.entry((log_entry.habit_id, log_entry.date)) {
        Entry::Vacant(slot) => {
            slot.insert(log_entry);
        }
        Entry::Occupied(mut slot) => {
            if slot.get().logged_at <= log_entry.logged_at {
                slot.insert(log_entry);
            }
        }
    }
}

/// Load all log entries from a CSV archive
fn load_entries_from_csv(path: &Path) -> Result<Vec<HabitLogEntry>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut entries = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match HabitLogEntry::try_from(row) {
                Ok(log_entry) => entries.push(log_entry),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                    // Continue processing other rows
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{JsonlJournal, LogSink};
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry_at(
        habit_id: Uuid,
        day: NaiveDate,
        completed: bool,
        logged_at: DateTime<Utc>,
    ) -> HabitLogEntry {
        HabitLogEntry {
            id: Uuid::new_v4(),
            habit_id,
            date: day,
            completed,
            logged_at,
        }
    }

    #[test]
    fn test_latest_entry_for_a_date_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("habit_log.journal");
        let csv_path = temp_dir.path().join("habit_log.csv");

        let habit_id = Uuid::new_v4();
        let day = date(2024, 1, 5);
        let now = Utc::now();

        // Completed first, corrected to missed an hour later
        let mut journal = JsonlJournal::new(&journal_path);
        journal.append(&entry_at(habit_id, day, true, now)).unwrap();
        journal
            .append(&entry_at(habit_id, day, false, now + Duration::hours(1)))
            .unwrap();

        let history = load_log_history(&journal_path, &csv_path).unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].completed);
    }

    #[test]
    fn test_journal_overrides_older_archive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("habit_log.journal");
        let csv_path = temp_dir.path().join("habit_log.csv");

        let habit_id = Uuid::new_v4();
        let day = date(2024, 1, 5);
        let now = Utc::now();

        // Archive an entry, then journal a correction for the same date
        let mut journal = JsonlJournal::new(&journal_path);
        journal.append(&entry_at(habit_id, day, false, now)).unwrap();
        crate::export::journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();

        let mut journal = JsonlJournal::new(&journal_path);
        journal
            .append(&entry_at(habit_id, day, true, now + Duration::hours(2)))
            .unwrap();

        let history = load_log_history(&journal_path, &csv_path).unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].completed);
    }

    #[test]
    fn test_history_survives_rollup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("habit_log.journal");
        let csv_path = temp_dir.path().join("habit_log.csv");

        let habit_id = Uuid::new_v4();
        let mut journal = JsonlJournal::new(&journal_path);
        for day in 1..=3 {
            journal
                .append(&entry_at(habit_id, date(2024, 1, day), true, Utc::now()))
                .unwrap();
        }

        crate::export::journal_to_csv_and_archive(&journal_path, &csv_path).unwrap();

        // Journal is archived now; the history must still see all entries
        let history = load_log_history(&journal_path, &csv_path).unwrap();
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_entries_sorted_oldest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("habit_log.journal");
        let csv_path = temp_dir.path().join("habit_log.csv");

        let habit_id = Uuid::new_v4();
        let mut journal = JsonlJournal::new(&journal_path);
        for day in [9, 2, 5] {
            journal
                .append(&entry_at(habit_id, date(2024, 1, day), true, Utc::now()))
                .unwrap();
        }

        let history = load_log_history(&journal_path, &csv_path).unwrap();
        let days: Vec<NaiveDate> = history.iter().map(|e| e.date).collect();
        assert_eq!(days, vec![date(2024, 1, 2), date(2024, 1, 5), date(2024, 1, 9)]);
    }

    #[test]
    fn test_logs_by_habit_groups_entries() {
        let reading = Uuid::new_v4();
        let running = Uuid::new_v4();
        let entries = vec![
            entry_at(reading, date(2024, 1, 1), true, Utc::now()),
            entry_at(running, date(2024, 1, 1), true, Utc::now()),
            entry_at(reading, date(2024, 1, 2), false, Utc::now()),
        ];

        let grouped = logs_by_habit(entries);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&reading].len(), 2);
        assert_eq!(grouped[&running].len(), 1);
    }

    #[test]
    fn test_missing_files_yield_empty_history() {
        let temp_dir = tempfile::tempdir().unwrap();
        let history = load_log_history(
            &temp_dir.path().join("nope.journal"),
            &temp_dir.path().join("nope.csv"),
        )
        .unwrap();
        assert!(history.is_empty());
    }
}
