//! In-memory record store.

use std::collections::{BTreeMap, HashMap};

use super::{RecordId, RecordStore, StoreError};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<RecordId, BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no record holds any field.
    pub fn is_empty(&self) -> bool {
        self.records.values().all(BTreeMap::is_empty)
    }

    /// All fields of one record, sorted by name.
    pub fn fields(&self, record: RecordId) -> Option<&BTreeMap<String, String>> {
        self.records.get(&record)
    }
}

impl RecordStore for MemoryStore {
    fn exists(&self, record: RecordId, field: &str) -> bool {
        self.records
            .get(&record)
            .is_some_and(|fields| fields.contains_key(field))
    }

    fn get(&self, record: RecordId, field: &str) -> Option<String> {
        self.records.get(&record)?.get(field).cloned()
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
        self.records
            .entry(record)
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, record: RecordId, field: &str) -> Result<(), StoreError> {
        if let Some(fields) = self.records.get_mut(&record) {
            fields.remove(field);
            if fields.is_empty() {
                self.records.remove(&record);
            }
        }
        Ok(())
    }
}
