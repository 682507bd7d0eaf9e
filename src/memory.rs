//! The persistent memory bank: meal history and family preferences.
//!
//! This is the only cross-run state in the whole system, so it is the one
//! place where correctness matters: no duplicate-day entries, no lost
//! updates, no corruption on a crash mid-write. The bank is an explicit
//! value passed through load/append/persist — no ambient singleton.

use crate::error::MemoryError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// One suggested meal, created once per day when a selection is finalized.
/// Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRecord {
    /// Calendar date the meal was suggested for
    pub date: NaiveDate,
    /// Name of the meal
    pub meal_name: String,
    /// Dietary/category labels (e.g. the main vegetable)
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl MealRecord {
    /// Create a new record for a date
    pub fn new(date: NaiveDate, meal_name: impl Into<String>) -> Self {
        Self {
            date,
            meal_name: meal_name.into(),
            tags: BTreeSet::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// The persisted aggregate: chronological meal history plus durable
/// preference facts ("no seafood", favorite dishes, ...).
///
/// Unknown top-level fields in a loaded file are captured in `extra` and
/// written back out, so manual edits to the file survive automated writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryBank {
    /// Meal records in chronological order
    #[serde(default)]
    pub records: Vec<MealRecord>,
    /// Standing family preferences, read-only to the pipeline
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
    /// Fields this version does not understand, preserved on rewrite
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MemoryBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Records with date in `[as_of - window_days, as_of]`, chronological.
    /// Pure query; retention is a filter here, never a storage compaction.
    pub fn recent_meals(&self, window_days: i64, as_of: NaiveDate) -> Vec<&MealRecord> {
        let earliest = as_of - chrono::Duration::days(window_days);
        self.records
            .iter()
            .filter(|r| r.date >= earliest && r.date <= as_of)
            .collect()
    }

    /// Whether a meal is already recorded for the given date
    pub fn has_record_for(&self, date: NaiveDate) -> bool {
        self.records.iter().any(|r| r.date == date)
    }

    /// Append a record, keeping date order.
    ///
    /// Fails with [`MemoryError::DuplicateDate`] if a record for that date
    /// already exists; a rerun on the same day must not silently duplicate.
    /// On failure the bank is unchanged.
    pub fn append(&mut self, record: MealRecord) -> Result<(), MemoryError> {
        match self.records.binary_search_by_key(&record.date, |r| r.date) {
            Ok(_) => Err(MemoryError::DuplicateDate(record.date)),
            Err(pos) => {
                self.records.insert(pos, record);
                Ok(())
            }
        }
    }

    /// Look up a preference value
    pub fn preference(&self, key: &str) -> Option<&str> {
        self.preferences.get(key).map(|v| v.as_str())
    }
}

/// Handle to the memory bank file on disk.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    path: PathBuf,
}

impl MemoryStore {
    /// Create a store for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the memory file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the bank from disk.
    ///
    /// A missing file yields an empty bank. A file that exists but cannot be
    /// parsed yields [`MemoryError::CorruptStore`]; the store never repairs
    /// or overwrites it on its own.
    pub async fn load(&self) -> Result<MemoryBank, MemoryError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MemoryBank::new());
            }
            Err(e) => return Err(MemoryError::Read(e)),
        };

        serde_json::from_str(&content).map_err(|e| MemoryError::CorruptStore {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Atomically write the bank to disk.
    ///
    /// Writes to a sibling temp file, then renames it into place, so a crash
    /// mid-write leaves the previous valid state intact.
    pub async fn persist(&self, bank: &MemoryBank) -> Result<(), MemoryError> {
        let content = serde_json::to_string_pretty(bank).map_err(|e| {
            MemoryError::Write(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(MemoryError::Write)?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, content).await.map_err(MemoryError::Write)?;
        fs::rename(&tmp, &self.path).await.map_err(MemoryError::Write)?;
        Ok(())
    }

    /// Sibling path used for the temp-then-rename write
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_append_keeps_date_order() {
        let mut bank = MemoryBank::new();
        bank.append(MealRecord::new(date(2024, 5, 10), "Grilled Chicken"))
            .unwrap();
        bank.append(MealRecord::new(date(2024, 5, 1), "Lentil Soup"))
            .unwrap();

        let names: Vec<_> = bank.records.iter().map(|r| r.meal_name.as_str()).collect();
        assert_eq!(names, vec!["Lentil Soup", "Grilled Chicken"]);
    }

    #[test]
    fn test_append_duplicate_date_leaves_bank_unchanged() {
        let mut bank = MemoryBank::new();
        bank.append(MealRecord::new(date(2024, 5, 1), "Lentil Soup"))
            .unwrap();
        let before = bank.clone();

        let err = bank
            .append(MealRecord::new(date(2024, 5, 1), "Daal Chawal"))
            .unwrap_err();
        assert!(matches!(err, MemoryError::DuplicateDate(d) if d == date(2024, 5, 1)));
        assert_eq!(bank, before);
    }

    #[test]
    fn test_recent_meals_window() {
        let mut bank = MemoryBank::new();
        bank.append(MealRecord::new(date(2024, 5, 1), "Lentil Soup"))
            .unwrap();
        bank.append(MealRecord::new(date(2024, 5, 10), "Grilled Chicken"))
            .unwrap();

        let both = bank.recent_meals(14, date(2024, 5, 12));
        let names: Vec<_> = both.iter().map(|r| r.meal_name.as_str()).collect();
        assert_eq!(names, vec!["Lentil Soup", "Grilled Chicken"]);

        let recent = bank.recent_meals(7, date(2024, 5, 12));
        let names: Vec<_> = recent.iter().map(|r| r.meal_name.as_str()).collect();
        assert_eq!(names, vec!["Grilled Chicken"]);
    }

    #[test]
    fn test_recent_meals_window_is_inclusive() {
        let mut bank = MemoryBank::new();
        bank.append(MealRecord::new(date(2024, 4, 28), "Edge Meal"))
            .unwrap();
        bank.append(MealRecord::new(date(2024, 4, 27), "Too Old"))
            .unwrap();
        bank.append(MealRecord::new(date(2024, 5, 12), "Today"))
            .unwrap();
        bank.append(MealRecord::new(date(2024, 5, 13), "Tomorrow"))
            .unwrap();

        let recent = bank.recent_meals(14, date(2024, 5, 12));
        let names: Vec<_> = recent.iter().map(|r| r.meal_name.as_str()).collect();
        assert_eq!(names, vec!["Edge Meal", "Today"]);
    }

    #[test]
    fn test_recent_meals_ignores_insertion_order() {
        let mut bank = MemoryBank::new();
        for day in [9, 3, 6, 1] {
            bank.append(MealRecord::new(date(2024, 5, day), format!("Meal {day}")))
                .unwrap();
        }
        let dates: Vec<_> = bank
            .recent_meals(14, date(2024, 5, 12))
            .iter()
            .map(|r| r.date)
            .collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn test_bank_serde_preserves_unknown_fields() {
        let raw = serde_json::json!({
            "records": [],
            "preferences": { "no_seafood": "true" },
            "favorites": ["Daal Chawal", "Chicken Handi White"]
        });
        let bank: MemoryBank = serde_json::from_value(raw).unwrap();
        assert!(bank.extra.contains_key("favorites"));

        let out = serde_json::to_value(&bank).unwrap();
        assert_eq!(
            out["favorites"],
            serde_json::json!(["Daal Chawal", "Chicken Handi White"])
        );
        assert_eq!(out["preferences"]["no_seafood"], "true");
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_empty_bank() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = MemoryStore::new(dir.path().join("memory_bank.json"));
        let bank = store.load().await.unwrap();
        assert!(bank.records.is_empty());
        assert!(bank.preferences.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memory_bank.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = MemoryStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, MemoryError::CorruptStore { .. }));
    }
}
