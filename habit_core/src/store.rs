//! Habit collection persistence with file locking.
//!
//! The store is a single JSON file holding the owner id and every habit.
//! Saves are atomic (temp file + rename); loads degrade to an empty store
//! with a warning rather than failing on a missing or corrupted file.

use crate::{Error, Habit, RecurrenceRule, Result};
use chrono::{NaiveDate, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// On-disk collection of a user's habits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HabitStore {
    /// Single local owner; stamped onto every habit as its `user_id`
    pub owner: Uuid,
    pub habits: Vec<Habit>,
}

impl Default for HabitStore {
    fn default() -> Self {
        Self {
            owner: Uuid::new_v4(),
            habits: Vec::new(),
        }
    }
}

impl HabitStore {
    /// Load the store from a file with shared locking
    ///
    /// Returns an empty store if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No habit store found, starting empty");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open habit store {:?}: {}. Starting empty.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock habit store {:?}: {}. Starting empty.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read habit store {:?}: {}. Starting empty.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<HabitStore>(&contents) {
            Ok(store) => {
                tracing::debug!("Loaded {} habits from {:?}", store.habits.len(), path);
                Ok(store)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse habit store {:?}: {}. Starting empty.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save the store to a file with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old store file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} habits to {:?}", self.habits.len(), path);
        Ok(())
    }

    /// Load the store, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut HabitStore) -> Result<()>,
    {
        let mut store = Self::load(path)?;
        f(&mut store)?;
        store.save(path)?;
        Ok(store)
    }

    /// Create a habit owned by this store's user
    pub fn add_habit(
        &mut self,
        name: &str,
        rule: RecurrenceRule,
        start_date: NaiveDate,
    ) -> Result<Habit> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Store("habit name is required".into()));
        }
        if self
            .habits
            .iter()
            .any(|habit| habit.name.eq_ignore_ascii_case(name))
        {
            return Err(Error::Store(format!("habit '{}' already exists", name)));
        }

        let habit = Habit {
            id: Uuid::new_v4(),
            user_id: self.owner,
            name: name.to_string(),
            rule,
            start_date,
            created_at: Utc::now(),
        };
        self.habits.push(habit.clone());

        tracing::info!("Added habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }

    /// Find a habit by case-insensitive name, falling back to id prefix
    pub fn find(&self, key: &str) -> Option<&Habit> {
        let lowered = key.trim().to_lowercase();
        self.habits
            .iter()
            .find(|habit| habit.name.to_lowercase() == lowered)
            .or_else(|| {
                self.habits
                    .iter()
                    .find(|habit| habit.id.to_string().starts_with(&lowered))
            })
    }

    /// Apply an update to a habit; any field may change, including the rule
    pub fn update_habit<F>(&mut self, key: &str, f: F) -> Result<Habit>
    where
        F: FnOnce(&mut Habit),
    {
        let index = self
            .position(key)
            .ok_or_else(|| Error::Store(format!("no habit matching '{}'", key)))?;
        f(&mut self.habits[index]);
        Ok(self.habits[index].clone())
    }

    /// Remove a habit and return it
    pub fn remove_habit(&mut self, key: &str) -> Result<Habit> {
        let index = self
            .position(key)
            .ok_or_else(|| Error::Store(format!("no habit matching '{}'", key)))?;
        let habit = self.habits.remove(index);
        tracing::info!("Removed habit '{}' ({})", habit.name, habit.id);
        Ok(habit)
    }

    fn position(&self, key: &str) -> Option<usize> {
        let lowered = key.trim().to_lowercase();
        self.habits
            .iter()
            .position(|habit| habit.name.to_lowercase() == lowered)
            .or_else(|| {
                self.habits
                    .iter()
                    .position(|habit| habit.id.to_string().starts_with(&lowered))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("habits.json");

        let mut store = HabitStore::default();
        store
            .add_habit("Reading", RecurrenceRule::Everyday, date(2024, 1, 1))
            .unwrap();
        store
            .add_habit(
                "Running",
                RecurrenceRule::Custom([1, 3, 5].into_iter().collect()),
                date(2024, 2, 1),
            )
            .unwrap();

        store.save(&store_path).unwrap();
        let loaded = HabitStore::load(&store_path).unwrap();

        assert_eq!(loaded.owner, store.owner);
        assert_eq!(loaded.habits.len(), 2);
        assert_eq!(loaded.habits[0].name, "Reading");
        assert_eq!(loaded.habits[1].rule, store.habits[1].rule);
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("nonexistent.json");

        let store = HabitStore::load(&store_path).unwrap();
        assert!(store.habits.is_empty());
    }

    #[test]
    fn test_corrupted_store_starts_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("corrupted.json");

        std::fs::write(&store_path, "{ invalid json }").unwrap();

        let store = HabitStore::load(&store_path).unwrap();
        assert!(store.habits.is_empty());
    }

    #[test]
    fn test_habits_get_the_store_owner() {
        let mut store = HabitStore::default();
        let habit = store
            .add_habit("Reading", RecurrenceRule::Everyday, date(2024, 1, 1))
            .unwrap();

        assert_eq!(habit.user_id, store.owner);
    }

    #[test]
    fn test_add_rejects_blank_and_duplicate_names() {
        let mut store = HabitStore::default();
        store
            .add_habit("Reading", RecurrenceRule::Everyday, date(2024, 1, 1))
            .unwrap();

        assert!(store
            .add_habit("  ", RecurrenceRule::Everyday, date(2024, 1, 1))
            .is_err());
        assert!(store
            .add_habit("reading", RecurrenceRule::Everyday, date(2024, 1, 1))
            .is_err());
    }

    #[test]
    fn test_find_by_name_and_id_prefix() {
        let mut store = HabitStore::default();
        let habit = store
            .add_habit("Reading", RecurrenceRule::Everyday, date(2024, 1, 1))
            .unwrap();

        assert_eq!(store.find("READING").map(|h| h.id), Some(habit.id));

        let prefix = &habit.id.to_string()[..8];
        assert_eq!(store.find(prefix).map(|h| h.id), Some(habit.id));

        assert!(store.find("unknown").is_none());
    }

    #[test]
    fn test_update_habit_can_change_rule() {
        let mut store = HabitStore::default();
        store
            .add_habit("Reading", RecurrenceRule::Everyday, date(2024, 1, 1))
            .unwrap();

        let updated = store
            .update_habit("Reading", |habit| {
                habit.rule = RecurrenceRule::Weekdays;
                habit.start_date = date(2024, 3, 1);
            })
            .unwrap();

        assert_eq!(updated.rule, RecurrenceRule::Weekdays);
        assert_eq!(store.habits[0].start_date, date(2024, 3, 1));
    }

    #[test]
    fn test_remove_habit() {
        let mut store = HabitStore::default();
        store
            .add_habit("Reading", RecurrenceRule::Everyday, date(2024, 1, 1))
            .unwrap();

        let removed = store.remove_habit("Reading").unwrap();
        assert_eq!(removed.name, "Reading");
        assert!(store.habits.is_empty());

        assert!(store.remove_habit("Reading").is_err());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("habits.json");

        HabitStore::default().save(&store_path).unwrap();

        HabitStore::update(&store_path, |store| {
            store
                .add_habit("Reading", RecurrenceRule::Everyday, date(2024, 1, 1))
                .map(|_| ())
        })
        .unwrap();

        let loaded = HabitStore::load(&store_path).unwrap();
        assert_eq!(loaded.habits.len(), 1);
    }

    #[test]
    fn test_atomic_save_leaves_no_stray_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store_path = temp_dir.path().join("habits.json");

        HabitStore::default().save(&store_path).unwrap();

        assert!(store_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "habits.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only habits.json, found extras: {:?}",
            extras
        );
    }
}
