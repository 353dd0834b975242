//! Recurrence evaluation: is a habit due on a given calendar date?
//!
//! Evaluation is pure and deterministic. A mis-configured custom rule is
//! surfaced as a value ([`DueStatus::MalformedRule`]), never as an error, so
//! one bad habit cannot take down a batch computation over many habits.

use crate::{Error, Habit, RecurrenceRule, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Outcome of evaluating a habit's recurrence rule for one date
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DueStatus {
    Due,
    NotDue,
    /// Custom rule with an empty or out-of-range day set; the caller decides
    /// how loudly to warn
    MalformedRule,
}

/// Weekday index with 0 = Sunday, matching the stored custom-day encoding
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Evaluate whether `habit` is scheduled on `date`.
///
/// Fails closed: dates before the habit's start date are never due.
pub fn due_status(habit: &Habit, date: NaiveDate) -> DueStatus {
    if date < habit.start_date {
        return DueStatus::NotDue;
    }

    match &habit.rule {
        RecurrenceRule::Everyday => DueStatus::Due,
        RecurrenceRule::Weekdays => {
            let day = weekday_index(date);
            if day > 0 && day < 6 {
                DueStatus::Due
            } else {
                DueStatus::NotDue
            }
        }
        RecurrenceRule::Custom(days) => {
            if days.is_empty() || days.iter().any(|day| *day > 6) {
                return DueStatus::MalformedRule;
            }
            if days.contains(&weekday_index(date)) {
                DueStatus::Due
            } else {
                DueStatus::NotDue
            }
        }
    }
}

/// Convenience wrapper collapsing [`DueStatus::MalformedRule`] to "not due"
pub fn is_due(habit: &Habit, date: NaiveDate) -> bool {
    due_status(habit, date) == DueStatus::Due
}

impl RecurrenceRule {
    /// Decode a rule from its boundary representation.
    ///
    /// `kind` is one of `everyday`, `weekdays` or `custom`; `days` carries
    /// the custom weekday set, either as a JSON array (`[1,3,5]`, the wire
    /// encoding) or as a bare comma list (`1,3,5`, the CLI flag encoding).
    /// Rejects unknown kinds, non-integer days and days outside 0-6, so a
    /// decoded rule is well-formed by construction.
    pub fn from_parts(kind: &str, days: Option<&str>) -> Result<Self> {
        match kind.to_lowercase().as_str() {
            "everyday" => Ok(RecurrenceRule::Everyday),
            "weekdays" => Ok(RecurrenceRule::Weekdays),
            "custom" => {
                let raw = days.ok_or_else(|| {
                    Error::Recurrence("custom schedule requires a day set".into())
                })?;
                let parsed = parse_day_set(raw)?;
                if parsed.is_empty() {
                    return Err(Error::Recurrence("custom day set is empty".into()));
                }
                Ok(RecurrenceRule::Custom(parsed))
            }
            other => Err(Error::Recurrence(format!(
                "unknown schedule kind '{}', expected everyday, weekdays or custom",
                other
            ))),
        }
    }
}

fn parse_day_set(raw: &str) -> Result<BTreeSet<u8>> {
    let trimmed = raw.trim();

    let values: Vec<i64> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|e| Error::Recurrence(format!("day set is not a JSON array: {}", e)))?
    } else {
        trimmed
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| {
                part.trim()
                    .parse::<i64>()
                    .map_err(|_| Error::Recurrence(format!("'{}' is not a day number", part)))
            })
            .collect::<Result<Vec<i64>>>()?
    };

    let mut days = BTreeSet::new();
    for value in values {
        if !(0..=6).contains(&value) {
            return Err(Error::Recurrence(format!(
                "day {} is out of range, expected 0-6 (0 = Sunday)",
                value
            )));
        }
        days.insert(value as u8);
    }
    Ok(days)
}
