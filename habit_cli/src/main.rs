use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use habit_core::*;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Parser)]
#[command(name = "habit")]
#[command(about = "Personal habit tracker with streaks and dashboards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override today's date (YYYY-MM-DD), mainly for scripting
    #[arg(long, global = true)]
    today: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new habit
    Add {
        name: String,

        /// Schedule kind (everyday, weekdays, custom)
        #[arg(long, default_value = "everyday")]
        schedule: String,

        /// Weekday numbers 0-6 (0 = Sunday) for a custom schedule, e.g. 1,3,5
        #[arg(long)]
        days: Option<String>,

        /// First day the habit is due (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start_date: Option<String>,
    },

    /// List habits with their streaks
    List {
        #[arg(long)]
        json: bool,
    },

    /// Update a habit's name, schedule or start date
    Edit {
        /// Habit name or id prefix
        habit: String,

        #[arg(long)]
        name: Option<String>,

        /// Schedule kind (everyday, weekdays, custom)
        #[arg(long)]
        schedule: Option<String>,

        /// Weekday numbers 0-6 for a custom schedule
        #[arg(long)]
        days: Option<String>,

        #[arg(long)]
        start_date: Option<String>,
    },

    /// Delete a habit
    Remove {
        /// Habit name or id prefix
        habit: String,
    },

    /// Record completion for a date (defaults to today)
    Log {
        /// Habit name or id prefix
        habit: String,

        /// Date to log (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Mark the day as missed instead of completed
        #[arg(long)]
        missed: bool,
    },

    /// Show habits due today with their completion status (default)
    Today {
        #[arg(long)]
        json: bool,
    },

    /// Show streaks for one habit
    Streak {
        /// Habit name or id prefix
        habit: String,

        #[arg(long)]
        json: bool,
    },

    /// Dashboard statistics over a period
    Stats {
        /// Reporting period (week, month, year)
        #[arg(long, default_value = "week")]
        period: String,

        #[arg(long)]
        json: bool,
    },

    /// Calendar heatmap points for a month or year
    Heatmap {
        /// Year to project (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,

        /// Month 1-12; omit for the whole year
        #[arg(long)]
        month: Option<u32>,

        /// Restrict to one habit (name or id prefix)
        #[arg(long)]
        habit: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Roll up the log journal into the CSV archive
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Show or update user settings
    Config {
        /// Display theme (light, dark, system)
        #[arg(long)]
        theme: Option<String>,

        /// Daily reminder time in HH:MM, or "off" to disable
        #[arg(long)]
        reminder: Option<String>,
    },
}

/// Well-known file locations under the data directory
struct DataPaths {
    store: PathBuf,
    journal: PathBuf,
    journal_dir: PathBuf,
    csv: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let journal_dir = data_dir.join("journal");
        Self {
            store: data_dir.join("habits.json"),
            journal: journal_dir.join("habit_log.journal"),
            journal_dir,
            csv: data_dir.join("habit_log.csv"),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    habit_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);

    // Dates are validated here, before anything reaches the core
    let today = match cli.today.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };

    match cli.command {
        Some(Commands::Add {
            name,
            schedule,
            days,
            start_date,
        }) => cmd_add(
            &paths,
            today,
            &name,
            &schedule,
            days.as_deref(),
            start_date.as_deref(),
        ),
        Some(Commands::List { json }) => cmd_list(&paths, today, json),
        Some(Commands::Edit {
            habit,
            name,
            schedule,
            days,
            start_date,
        }) => cmd_edit(&paths, &habit, name, schedule, days, start_date),
        Some(Commands::Remove { habit }) => cmd_remove(&paths, &habit),
        Some(Commands::Log {
            habit,
            date,
            missed,
        }) => cmd_log(&paths, today, &habit, date.as_deref(), missed),
        Some(Commands::Today { json }) => cmd_today(&paths, today, json),
        Some(Commands::Streak { habit, json }) => cmd_streak(&paths, today, &habit, json),
        Some(Commands::Stats { period, json }) => cmd_stats(&paths, today, &period, json),
        Some(Commands::Heatmap {
            year,
            month,
            habit,
            json,
        }) => cmd_heatmap(&paths, today, year, month, habit.as_deref(), json),
        Some(Commands::Rollup { cleanup }) => cmd_rollup(&paths, cleanup),
        Some(Commands::Config { theme, reminder }) => {
            cmd_config(theme.as_deref(), reminder.as_deref())
        }
        None => {
            // Default to the "today" view
            cmd_today(&paths, today, false)
        }
    }
}

fn cmd_add(
    paths: &DataPaths,
    today: NaiveDate,
    name: &str,
    schedule: &str,
    days: Option<&str>,
    start_date: Option<&str>,
) -> Result<()> {
    let rule = RecurrenceRule::from_parts(schedule, days)?;
    let start = match start_date {
        Some(raw) => parse_date(raw)?,
        None => today,
    };

    let mut store = HabitStore::load(&paths.store)?;
    let habit = store.add_habit(name, rule, start)?;
    store.save(&paths.store)?;

    println!(
        "✓ Added '{}' ({}, starts {})",
        habit.name,
        describe_rule(&habit.rule),
        habit.start_date
    );
    Ok(())
}

fn cmd_list(paths: &DataPaths, today: NaiveDate, json: bool) -> Result<()> {
    let store = HabitStore::load(&paths.store)?;
    let grouped = logs_by_habit(load_log_history(&paths.journal, &paths.csv)?);

    let rows: Vec<(&Habit, StreakResult)> = store
        .habits
        .iter()
        .map(|habit| {
            let logs = grouped.get(&habit.id).map(Vec::as_slice).unwrap_or(&[]);
            (habit, compute_streaks(logs, today))
        })
        .collect();

    if json {
        let payload: Vec<serde_json::Value> = rows
            .iter()
            .map(|(habit, streaks)| {
                serde_json::json!({
                    "id": habit.id,
                    "name": habit.name,
                    "rule": habit.rule,
                    "start_date": habit.start_date,
                    "current_streak": streaks.current_streak,
                    "longest_streak": streaks.longest_streak,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No habits yet. Add one with `habit add <name>`.");
        return Ok(());
    }

    println!("Habits:");
    for (habit, streaks) in rows {
        println!(
            "  {}  [{}]  current {} / longest {}",
            habit.name,
            describe_rule(&habit.rule),
            streaks.current_streak,
            streaks.longest_streak
        );
    }
    Ok(())
}

fn cmd_edit(
    paths: &DataPaths,
    habit_key: &str,
    name: Option<String>,
    schedule: Option<String>,
    days: Option<String>,
    start_date: Option<String>,
) -> Result<()> {
    if let Some(ref new_name) = name {
        if new_name.trim().is_empty() {
            return Err(Error::Store("habit name is required".into()));
        }
    }

    // `--days` alone implies a custom schedule
    let new_rule = match (&schedule, &days) {
        (None, None) => None,
        (kind, day_set) => Some(RecurrenceRule::from_parts(
            kind.as_deref().unwrap_or("custom"),
            day_set.as_deref(),
        )?),
    };
    let new_start = start_date.as_deref().map(parse_date).transpose()?;

    let mut store = HabitStore::load(&paths.store)?;
    let updated = store.update_habit(habit_key, |habit| {
        if let Some(new_name) = name {
            habit.name = new_name.trim().to_string();
        }
        if let Some(rule) = new_rule {
            habit.rule = rule;
        }
        if let Some(start) = new_start {
            habit.start_date = start;
        }
    })?;
    store.save(&paths.store)?;

    println!(
        "✓ Updated '{}' ({}, starts {})",
        updated.name,
        describe_rule(&updated.rule),
        updated.start_date
    );
    Ok(())
}

fn cmd_remove(paths: &DataPaths, habit_key: &str) -> Result<()> {
    let mut store = HabitStore::load(&paths.store)?;
    let removed = store.remove_habit(habit_key)?;
    store.save(&paths.store)?;

    println!("✓ Removed '{}'", removed.name);
    Ok(())
}

fn cmd_log(
    paths: &DataPaths,
    today: NaiveDate,
    habit_key: &str,
    date: Option<&str>,
    missed: bool,
) -> Result<()> {
    let store = HabitStore::load(&paths.store)?;
    let habit = store
        .find(habit_key)
        .ok_or_else(|| Error::Store(format!("no habit matching '{}'", habit_key)))?;

    let day = match date {
        Some(raw) => parse_date(raw)?,
        None => today,
    };

    let log_entry = HabitLogEntry {
        id: Uuid::new_v4(),
        habit_id: habit.id,
        date: day,
        completed: !missed,
        logged_at: Utc::now(),
    };

    let mut journal = JsonlJournal::new(&paths.journal);
    journal.append(&log_entry)?;

    println!(
        "✓ Logged '{}' as {} for {}",
        habit.name,
        if missed { "missed" } else { "completed" },
        day
    );
    Ok(())
}

fn cmd_today(paths: &DataPaths, today: NaiveDate, json: bool) -> Result<()> {
    let store = HabitStore::load(&paths.store)?;
    let grouped = logs_by_habit(load_log_history(&paths.journal, &paths.csv)?);

    let mut due = Vec::new();
    for habit in &store.habits {
        match due_status(habit, today) {
            DueStatus::Due => {
                let logs = grouped.get(&habit.id).map(Vec::as_slice).unwrap_or(&[]);
                let streaks = compute_streaks(logs, today);
                let done_today = logs
                    .iter()
                    .find(|entry| entry.date == today)
                    .map(|entry| entry.completed);
                due.push((habit, streaks, done_today));
            }
            DueStatus::NotDue => {}
            DueStatus::MalformedRule => {
                tracing::warn!(
                    "Habit '{}' has a malformed recurrence rule, treating as not due",
                    habit.name
                );
            }
        }
    }

    if json {
        let payload: Vec<serde_json::Value> = due
            .iter()
            .map(|(habit, streaks, done_today)| {
                serde_json::json!({
                    "id": habit.id,
                    "name": habit.name,
                    "current_streak": streaks.current_streak,
                    "longest_streak": streaks.longest_streak,
                    "today_completed": done_today,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Due on {}:", today);
    if due.is_empty() {
        println!("  nothing due");
        return Ok(());
    }
    for (habit, streaks, done_today) in due {
        let marker = match done_today {
            Some(true) => "✓",
            Some(false) => "✗",
            None => " ",
        };
        println!(
            "  [{}] {}  current {} / longest {}",
            marker, habit.name, streaks.current_streak, streaks.longest_streak
        );
    }
    Ok(())
}

fn cmd_streak(paths: &DataPaths, today: NaiveDate, habit_key: &str, json: bool) -> Result<()> {
    let store = HabitStore::load(&paths.store)?;
    let habit = store
        .find(habit_key)
        .ok_or_else(|| Error::Store(format!("no habit matching '{}'", habit_key)))?;

    let grouped = logs_by_habit(load_log_history(&paths.journal, &paths.csv)?);
    let logs = grouped.get(&habit.id).map(Vec::as_slice).unwrap_or(&[]);
    let streaks = compute_streaks(logs, today);

    if json {
        let payload = serde_json::json!({
            "habit_id": habit.id,
            "current_streak": streaks.current_streak,
            "longest_streak": streaks.longest_streak,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!(
        "{}: current streak {} day(s), longest {} day(s)",
        habit.name, streaks.current_streak, streaks.longest_streak
    );
    Ok(())
}

fn cmd_stats(paths: &DataPaths, today: NaiveDate, period: &str, json: bool) -> Result<()> {
    let period = match period.to_lowercase().as_str() {
        "week" => Period::Week,
        "month" => Period::Month,
        "year" => Period::Year,
        other => {
            eprintln!("Unknown period: {}. Using week.", other);
            Period::Week
        }
    };
    let (start, end) = period.range(today);

    let store = HabitStore::load(&paths.store)?;
    let grouped = logs_by_habit(load_log_history(&paths.journal, &paths.csv)?);
    let report = build_stats(&store.habits, &grouped, start, end);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Stats {} to {}", start, end);
    println!("  habits:    {}", report.summary.total_habits);
    println!(
        "  completed: {}   missed: {}   rate: {}%",
        report.summary.total_completions,
        report.summary.total_missed,
        report.summary.completion_rate
    );
    if !report.top_habits.is_empty() {
        println!("  top habits:");
        for top in &report.top_habits {
            println!("    {}  ({} day streak)", top.name, top.longest_streak);
        }
    }
    println!(
        "  ({} daily buckets; use --json for the full series)",
        report.daily_series.len()
    );
    Ok(())
}

fn cmd_heatmap(
    paths: &DataPaths,
    today: NaiveDate,
    year: Option<i32>,
    month: Option<u32>,
    habit_key: Option<&str>,
    json: bool,
) -> Result<()> {
    if let Some(m) = month {
        if !(1..=12).contains(&m) {
            return Err(Error::Date(format!("invalid month {}, expected 1-12", m)));
        }
    }

    let store = HabitStore::load(&paths.store)?;
    let habit_id = match habit_key {
        Some(key) => Some(
            store
                .find(key)
                .ok_or_else(|| Error::Store(format!("no habit matching '{}'", key)))?
                .id,
        ),
        None => None,
    };

    let year = year.unwrap_or_else(|| today.year());
    let history = load_log_history(&paths.journal, &paths.csv)?;
    let points = project(&store.habits, &history, year, month, habit_id);

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    println!("{} heatmap point(s)", points.len());
    for point in &points {
        println!(
            "  {}  {}  {}",
            point.date,
            if point.value == 1 { "✓" } else { "✗" },
            point.habit_name
        );
    }
    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.journal.exists() {
        println!("No journal found - nothing to roll up.");
        return Ok(());
    }

    let count = habit_core::export::journal_to_csv_and_archive(&paths.journal, &paths.csv)?;

    println!("✓ Rolled up {} log entries to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = habit_core::export::cleanup_processed_journals(&paths.journal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal files", cleaned);
        }
    }

    Ok(())
}

fn cmd_config(theme: Option<&str>, reminder: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;

    if theme.is_none() && reminder.is_none() {
        let theme_name = match config.appearance.theme {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        };
        println!("theme:    {}", theme_name);
        println!(
            "reminder: {}",
            config.reminder.time.as_deref().unwrap_or("off")
        );
        return Ok(());
    }

    if let Some(raw) = theme {
        config.appearance.theme = match raw.to_lowercase().as_str() {
            "light" => Theme::Light,
            "dark" => Theme::Dark,
            "system" => Theme::System,
            other => {
                return Err(Error::Config(format!(
                    "unknown theme '{}', expected light, dark or system",
                    other
                )))
            }
        };
    }

    if let Some(raw) = reminder {
        if raw.eq_ignore_ascii_case("off") {
            config.reminder.time = None;
        } else {
            config.reminder.time = Some(raw.to_string());
            config.reminder.validated_time()?;
        }
    }

    config.save()?;
    println!("✓ Settings saved");
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::Date(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

fn describe_rule(rule: &RecurrenceRule) -> String {
    match rule {
        RecurrenceRule::Everyday => "everyday".into(),
        RecurrenceRule::Weekdays => "weekdays".into(),
        RecurrenceRule::Custom(days) => {
            let names: Vec<&str> = days
                .iter()
                .map(|day| DAY_NAMES.get(usize::from(*day)).copied().unwrap_or("?"))
                .collect();
            names.join(", ")
        }
    }
}
