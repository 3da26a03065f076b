//! File-based record store at ~/.locgeo/records.json.
//!
//! One JSON object keyed by record id. Each record carries its fields and the
//! time of its last change. The whole file is rewritten after every mutation.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{RecordId, RecordStore, StoreError};

#[derive(Serialize, Deserialize, Clone, Default)]
struct RecordEntry {
    #[serde(default)]
    fields: BTreeMap<String, String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    updated_at: i64,
}

/// The JSON-file record store.
pub struct JsonFileStore {
    path: PathBuf,
    records: BTreeMap<RecordId, RecordEntry>,
}

impl JsonFileStore {
    /// Open the store at the default location (~/.locgeo/records.json).
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_path())
    }

    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let records = Self::read_file(&path)?;
        debug!(path = %path.display(), records = records.len(), "opened record store");
        Ok(Self { path, records })
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".locgeo")
            .join("records.json")
    }

    fn read_file(path: &Path) -> Result<BTreeMap<RecordId, RecordEntry>, StoreError> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&data).map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json).map_err(io_err)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the record last changed, if it exists.
    pub fn updated_at(&self, record: RecordId) -> Option<DateTime<Utc>> {
        let entry = self.records.get(&record)?;
        Utc.timestamp_millis_opt(entry.updated_at).single()
    }

    /// Number of records holding at least one field.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for JsonFileStore {
    fn exists(&self, record: RecordId, field: &str) -> bool {
        self.records
            .get(&record)
            .is_some_and(|entry| entry.fields.contains_key(field))
    }

    fn get(&self, record: RecordId, field: &str) -> Option<String> {
        self.records.get(&record)?.fields.get(field).cloned()
    }

    fn set(
        &mut self,
        record: RecordId,
        field: &str,
        value: &str,
        create_if_absent: bool,
    ) -> Result<(), StoreError> {
        if !create_if_absent && !self.exists(record, field) {
            return Ok(());
        }
        let entry = self.records.entry(record).or_default();
        entry.fields.insert(field.to_string(), value.to_string());
        entry.updated_at = Utc::now().timestamp_millis();
        self.persist()
    }

    fn delete(&mut self, record: RecordId, field: &str) -> Result<(), StoreError> {
        let Some(entry) = self.records.get_mut(&record) else {
            return Ok(());
        };
        if entry.fields.remove(field).is_none() {
            return Ok(());
        }
        if entry.fields.is_empty() {
            self.records.remove(&record);
        } else {
            entry.updated_at = Utc::now().timestamp_millis();
        }
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (JsonFileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        (JsonFileStore::open(path).unwrap(), dir)
    }

    #[test]
    fn test_store_set_get() {
        let (mut store, _dir) = test_store();
        store.set(12, "field_geo_city", "Utrecht", true).unwrap();
        assert!(store.exists(12, "field_geo_city"));
        assert_eq!(store.get(12, "field_geo_city").as_deref(), Some("Utrecht"));
        assert!(store.updated_at(12).is_some());
        assert!(store.get(13, "field_geo_city").is_none());
    }

    #[test]
    fn test_store_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("records.json");

        // Write
        {
            let mut store = JsonFileStore::open(path.clone()).unwrap();
            store
                .set(7, "geometry", r#"{"type":"Feature"}"#, true)
                .unwrap();
        }

        // Read back
        let store = JsonFileStore::open(path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(7, "geometry").as_deref(),
            Some(r#"{"type":"Feature"}"#)
        );
    }

    #[test]
    fn test_store_set_without_create() {
        let (mut store, _dir) = test_store();
        store.set(1, "geometry", "{}", false).unwrap();
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_store_delete_drops_empty_record() {
        let (mut store, _dir) = test_store();
        store.set(1, "a", "1", true).unwrap();
        store.set(1, "b", "2", true).unwrap();
        store.delete(1, "a").unwrap();
        assert_eq!(store.len(), 1);
        store.delete(1, "b").unwrap();
        assert!(store.is_empty());
        store.delete(1, "b").unwrap();

        let reopened = JsonFileStore::open(store.path().to_path_buf()).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_store_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(path),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_store_reads_entries_without_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        let json = r#"{
            "42": { "fields": { "field_geo_city": "Delft" } }
        }"#;
        fs::write(&path, json).unwrap();

        let store = JsonFileStore::open(path).unwrap();
        assert_eq!(store.get(42, "field_geo_city").as_deref(), Some("Delft"));
    }
}
