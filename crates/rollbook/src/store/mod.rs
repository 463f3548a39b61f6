//! Record store for rollbook.
//!
//! This module owns the in-memory set of student records and keeps it in
//! step with a JSON backing file. Every mutation rewrites the whole file
//! before returning.
//!
//! One process is expected to own the backing file. Changes made to the
//! file by anyone else between a refresh and the next mutation are lost.

pub mod file;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::record::{Record, RecordUpdate};

pub use file::{read_records, write_records, RecordMap, WriteOptions};

/// Authoritative set of student records backed by a JSON file.
///
/// The store performs no validation of its own: adding an id that already
/// exists replaces the old record, and blank ids or names are accepted.
/// Callers check [`RecordStore::contains`] and
/// [`validate_new_record`](crate::record::validate_new_record) first.
#[derive(Debug)]
pub struct RecordStore {
    /// Path to the backing file.
    path: PathBuf,
    /// Records keyed by id.
    records: RecordMap,
    /// How saves are written.
    options: WriteOptions,
}

impl RecordStore {
    /// Open the store backed by `path`.
    ///
    /// A missing file opens as an empty store. A missing parent directory is
    /// not created; the first save into it fails with [`Error::FileWrite`].
    ///
    /// [`Error::FileWrite`]: crate::Error::FileWrite
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, WriteOptions::default())
    }

    /// Open the store with explicit write options.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open_with(path: impl AsRef<Path>, options: WriteOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = Self::load(&path)?;
        info!("Opened {} records from {}", records.len(), path.display());
        Ok(Self {
            path,
            records,
            options,
        })
    }

    /// Read the records stored at `path` without opening a store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptData`](crate::Error::CorruptData) if the file
    /// exists but is malformed, or [`Error::FileRead`](crate::Error::FileRead)
    /// if it cannot be read.
    pub fn load(path: &Path) -> Result<RecordMap> {
        debug!("Loading records from {}", path.display());
        read_records(path)
    }

    /// Re-read the backing file, discarding the in-memory records.
    ///
    /// On error the in-memory records are left as they were.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptData`](crate::Error::CorruptData) if the file
    /// exists but is malformed.
    pub fn refresh(&mut self) -> Result<()> {
        self.records = Self::load(&self.path)?;
        debug!("Refreshed {} records", self.records.len());
        Ok(())
    }

    /// Write every record to the backing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        debug!(
            "Saving {} records to {}",
            self.records.len(),
            self.path.display()
        );
        write_records(&self.path, &self.records, self.options)
    }

    /// Get the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a record stamped with the current time and save.
    ///
    /// An existing record with the same id is replaced without warning.
    /// Returns `true` once the file has been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        grade: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Result<bool> {
        let record = Record::new(id, name, grade, email, phone);
        let id = record.id.clone();

        if self.records.insert(id.clone(), record).is_some() {
            debug!("Replaced existing record {}", id);
        }
        self.save()?;

        info!("Added record {}", id);
        Ok(true)
    }

    /// Apply `update` to the record with the given id, stamp it as modified and save.
    ///
    /// Returns `false` without touching memory or disk if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn update(&mut self, id: &str, update: &RecordUpdate) -> Result<bool> {
        let Some(record) = self.records.get_mut(id) else {
            warn!("Cannot update unknown record {}", id);
            return Ok(false);
        };

        update.apply_to(record);
        record.modified = Some(crate::record::timestamp_now());
        self.save()?;

        info!("Updated record {}", id);
        Ok(true)
    }

    /// Remove the record with the given id and save.
    ///
    /// Returns `false` without touching memory or disk if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        if self.records.remove(id).is_none() {
            warn!("Cannot delete unknown record {}", id);
            return Ok(false);
        }
        self.save()?;

        info!("Deleted record {}", id);
        Ok(true)
    }

    /// Find records matching `query`, in store order.
    ///
    /// See [`Record::matches`] for the matching rules.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<(&str, &Record)> {
        let results: Vec<_> = self
            .records
            .iter()
            .filter(|(_, record)| record.matches(query))
            .map(|(id, record)| (id.as_str(), record))
            .collect();
        debug!("Search {:?} matched {} records", query, results.len());
        results
    }

    /// Get a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Check whether a record with the given id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over all records in store order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn records(&self) -> &RecordMap {
        &self.records
    }

    /// Records created on the given `YYYY-MM-DD` day, in store order.
    #[must_use]
    pub fn created_on(&self, day: &str) -> Vec<&Record> {
        self.iter().filter(|record| record.created_on(day)).collect()
    }

    /// Count records per grade, ordered by grade.
    ///
    /// Records without a grade are counted under the empty string.
    #[must_use]
    pub fn grade_breakdown(&self) -> BTreeMap<&str, usize> {
        let mut grades = BTreeMap::new();
        for record in self.iter() {
            *grades.entry(record.grade_or_blank()).or_insert(0) += 1;
        }
        grades
    }

    /// Summary counts, using `today` (`YYYY-MM-DD`) for the added-today figure.
    #[must_use]
    pub fn stats(&self, today: &str) -> StoreStats {
        let distinct_grades = self
            .grade_breakdown()
            .keys()
            .filter(|grade| !grade.is_empty())
            .count();

        StoreStats {
            total: self.len(),
            distinct_grades,
            added_today: self.created_on(today).len(),
        }
    }
}

/// Summary counts over the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Total number of records.
    pub total: usize,
    /// Number of distinct non-empty grades.
    pub distinct_grades: usize,
    /// Number of records created today.
    pub added_today: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn create_test_store() -> (TempDir, RecordStore) {
        let dir = tempdir().expect("failed to create temp dir");
        let store = RecordStore::open(dir.path().join("students.json"))
            .expect("failed to open test store");
        (dir, store)
    }

    fn add_ana(store: &mut RecordStore) {
        store
            .add("S001", "Ana Lee", "10th", "ana@x.com", "+1-555-0100")
            .unwrap();
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_dir, store) = create_test_store();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_open_does_not_create_parent_dirs() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        let path = nested.join("students.json");

        let mut store = RecordStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(!nested.exists());

        let err = store
            .add("S001", "Ana Lee", "10th", "ana@x.com", "+1-555-0100")
            .unwrap_err();
        assert!(matches!(err, crate::Error::FileWrite { .. }));
        assert!(!nested.exists());
    }

    #[test]
    fn test_open_unreadable_path_fails() {
        let dir = tempdir().unwrap();
        let err = RecordStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, crate::Error::FileRead { .. }));
    }

    #[test]
    fn test_save_keeps_missing_fields_missing() {
        let (_dir, mut store) = create_test_store();
        std::fs::write(store.path(), r#"{"S001": {"name": "Ana"}}"#).unwrap();
        store.refresh().unwrap();

        assert!(store.update("S001", &RecordUpdate::new().grade("10th")).unwrap());

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(!text.contains("created"));
        assert!(!text.contains("email"));
        assert!(text.contains("\"grade\": \"10th\""));
        assert!(text.contains("modified"));
    }

    #[test]
    fn test_add_persists_immediately() {
        let (_dir, mut store) = create_test_store();
        assert!(store.add("S001", "Ana Lee", "10th", "", "").unwrap());

        let on_disk = RecordStore::load(store.path()).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk["S001"].name, "Ana Lee");
    }

    #[test]
    fn test_add_sets_created_without_modified() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);

        let record = store.get("S001").unwrap();
        assert!(record.created.is_some());
        assert!(record.modified.is_none());
    }

    #[test]
    fn test_add_duplicate_overwrites() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);
        assert!(store.add("S001", "Someone Else", "", "", "").unwrap());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("S001").unwrap().name, "Someone Else");
        assert_eq!(store.get("S001").unwrap().email.as_deref(), Some(""));
    }

    #[test]
    fn test_keys_match_record_ids() {
        let (_dir, mut store) = create_test_store();
        for id in ["S003", "S001", "S002", "S001"] {
            store.add(id, "Name", "", "", "").unwrap();
        }

        assert_eq!(store.len(), 3);
        for (key, record) in store.records() {
            assert_eq!(key, &record.id);
        }
    }

    #[test]
    fn test_update_applies_non_empty_fields() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);
        let created = store.get("S001").unwrap().created.clone();

        let update = RecordUpdate::new().grade("11th").name("").email("");
        assert!(store.update("S001", &update).unwrap());

        let record = store.get("S001").unwrap();
        assert_eq!(record.grade.as_deref(), Some("11th"));
        assert_eq!(record.name, "Ana Lee");
        assert_eq!(record.email.as_deref(), Some("ana@x.com"));
        assert_eq!(record.created, created);
        assert!(record.modified.is_some());
    }

    #[test]
    fn test_update_without_changes_still_sets_modified() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);

        assert!(store.update("S001", &RecordUpdate::new()).unwrap());
        assert!(store.get("S001").unwrap().is_modified());

        let on_disk = RecordStore::load(store.path()).unwrap();
        assert!(on_disk["S001"].modified.is_some());
    }

    #[test]
    fn test_update_unknown_id() {
        let (_dir, mut store) = create_test_store();
        assert!(!store.update("S404", &RecordUpdate::new().name("X")).unwrap());
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_delete() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);

        assert!(store.delete("S001").unwrap());
        assert!(store.get("S001").is_none());
        assert!(RecordStore::load(store.path()).unwrap().is_empty());
    }

    #[test]
    fn test_delete_nonexistent_leaves_file_untouched() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);
        let before = std::fs::read(store.path()).unwrap();

        assert!(!store.delete("S404").unwrap());
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_search_or_semantics() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);
        store
            .add("S002", "Bo Kim", "9th", "bo@y.org", "+1-555-X100")
            .unwrap();

        let ids = |query: &str| -> Vec<String> {
            store
                .search(query)
                .into_iter()
                .map(|(id, _)| id.to_string())
                .collect()
        };

        assert_eq!(ids("ana"), vec!["S001"]);
        assert_eq!(ids("ANA"), vec!["S001"]);
        assert_eq!(ids("555"), vec!["S001", "S002"]);
        assert_eq!(ids("X100"), vec!["S002"]);
        assert!(ids("x100").is_empty());
        assert_eq!(ids("s00"), vec!["S001", "S002"]);
        assert!(ids("nobody").is_empty());
    }

    #[test]
    fn test_search_returns_matching_pairs() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);

        let results = store.search("lee");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, results[0].1.id);
    }

    #[test]
    fn test_refresh_discards_in_memory_state() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);

        let mut other = RecordStore::open(store.path()).unwrap();
        other.add("S002", "Bo Kim", "", "", "").unwrap();

        assert_eq!(store.len(), 1);
        store.refresh().unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_refresh_corrupt_file_keeps_records() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);
        std::fs::write(store.path(), "not json").unwrap();

        let err = store.refresh().unwrap_err();
        assert!(err.is_corrupt_data());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_open_corrupt_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("students.json");
        std::fs::write(&path, "{\"S001\": 42}").unwrap();

        let err = RecordStore::open(&path).unwrap_err();
        assert!(err.is_corrupt_data());
    }

    #[test]
    fn test_grade_breakdown_and_stats() {
        let (_dir, mut store) = create_test_store();
        store.add("S001", "Ana", "10th", "", "").unwrap();
        store.add("S002", "Bo", "10th", "", "").unwrap();
        store.add("S003", "Cy", "9th", "", "").unwrap();
        store.add("S004", "Dee", "", "", "").unwrap();

        let grades = store.grade_breakdown();
        assert_eq!(grades.get("10th"), Some(&2));
        assert_eq!(grades.get("9th"), Some(&1));
        assert_eq!(grades.get(""), Some(&1));
        assert_eq!(grades.keys().copied().collect::<Vec<_>>(), ["", "10th", "9th"]);

        let stats = store.stats(&crate::record::today());
        assert_eq!(
            stats,
            StoreStats {
                total: 4,
                distinct_grades: 2,
                added_today: 4,
            }
        );
        assert_eq!(store.stats("1999-01-01").added_today, 0);
    }

    #[test]
    fn test_created_on() {
        let (_dir, mut store) = create_test_store();
        add_ana(&mut store);

        assert_eq!(store.created_on(&crate::record::today()).len(), 1);
        assert!(store.created_on("1999-01-01").is_empty());
    }

    #[test]
    fn test_save_without_atomic_writes() {
        let dir = tempdir().unwrap();
        let options = WriteOptions {
            atomic: false,
            pretty: true,
        };
        let mut store = RecordStore::open_with(dir.path().join("students.json"), options).unwrap();
        add_ana(&mut store);

        let reopened = RecordStore::open(store.path()).unwrap();
        assert_eq!(reopened.records(), store.records());
    }
}
