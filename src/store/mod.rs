//! Record store: named string fields keyed by record id.
//!
//! The geometry subsystem only talks to the store through `RecordStore`.
//! `MemoryStore` backs tests and embedding callers; `JsonFileStore` persists
//! to a single JSON file for the CLI and the HTTP server.

pub mod file;
pub mod memory;

use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::geometry::AddressRecord;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Identifies the record (post) a location belongs to.
pub type RecordId = u64;

/// Field names used on a location record.
pub mod fields {
    pub const GEOMETRY: &str = "geometry";
    pub const ADDRESS: &str = "field_geo_address";
    pub const ZIPCODE: &str = "field_geo_zipcode";
    pub const CITY: &str = "field_geo_city";
    pub const COUNTRY: &str = "field_geo_country";
    pub const LATITUDE: &str = "field_geo_latitude";
    pub const LONGITUDE: &str = "field_geo_longitude";

    pub const ADDRESS_FIELDS: [&str; 4] = [ADDRESS, ZIPCODE, CITY, COUNTRY];
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access record store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("record store at {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot serialize record data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key/value field access by record id.
pub trait RecordStore {
    fn exists(&self, record: RecordId, field: &str) -> bool;

    fn get(&self, record: RecordId, field: &str) -> Option<String>;

    /// Write a field. With `create_if_absent == false` only an existing field
    /// is overwritten; an absent one stays absent.
    fn set(
        &mut self,
        record: RecordId,
        field: &str,
        value: &str,
        create_if_absent: bool,
    ) -> Result<(), StoreError>;

    /// Remove a field. Removing an absent field is not an error.
    fn delete(&mut self, record: RecordId, field: &str) -> Result<(), StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn exists(&self, record: RecordId, field: &str) -> bool {
        (**self).exists(record, field)
    }

    fn get(&self, record: RecordId, field: &str) -> Option<String> {
        (**self).get(record, field)
    }

    fn set(
        &mut self,
        record: RecordId,
        field: &str,
        value: &str,
        create_if_absent: bool,
    ) -> Result<(), StoreError> {
        (**self).set(record, field, value, create_if_absent)
    }

    fn delete(&mut self, record: RecordId, field: &str) -> Result<(), StoreError> {
        (**self).delete(record, field)
    }
}

/// Read the address fields of a record. Absent fields read as empty.
pub fn load_address<S: RecordStore + ?Sized>(store: &S, record: RecordId) -> AddressRecord {
    let field = |name: &str| store.get(record, name).unwrap_or_default();
    AddressRecord {
        street: field(fields::ADDRESS),
        zipcode: field(fields::ZIPCODE),
        city: field(fields::CITY),
        country: field(fields::COUNTRY),
    }
}

/// Write the four address fields verbatim.
pub fn save_address<S: RecordStore + ?Sized>(
    store: &mut S,
    record: RecordId,
    address: &AddressRecord,
) -> Result<(), StoreError> {
    store.set(record, fields::ADDRESS, &address.street, true)?;
    store.set(record, fields::ZIPCODE, &address.zipcode, true)?;
    store.set(record, fields::CITY, &address.city, true)?;
    store.set(record, fields::COUNTRY, &address.country, true)
}

/// Remove the stored geometry and the geocoded latitude/longitude.
pub fn delete_geometry_object<S: RecordStore + ?Sized>(
    store: &mut S,
    record: RecordId,
) -> Result<(), StoreError> {
    debug!(record, "deleting geometry object");
    store.delete(record, fields::GEOMETRY)?;
    store.delete(record, fields::LATITUDE)?;
    store.delete(record, fields::LONGITUDE)
}

/// Remove the geometry, the geocoded latitude/longitude and the address text.
pub fn delete_geometry_object_and_address<S: RecordStore + ?Sized>(
    store: &mut S,
    record: RecordId,
) -> Result<(), StoreError> {
    delete_geometry_object(store, record)?;
    debug!(record, "deleting address fields");
    for field in fields::ADDRESS_FIELDS {
        store.delete(record, field)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> MemoryStore {
        let mut store = MemoryStore::new();
        for field in [
            fields::GEOMETRY,
            fields::ADDRESS,
            fields::ZIPCODE,
            fields::CITY,
            fields::COUNTRY,
            fields::LATITUDE,
            fields::LONGITUDE,
        ] {
            store.set(1, field, "x", true).unwrap();
        }
        store
    }

    #[test]
    fn test_address_round_trip() {
        let mut store = MemoryStore::new();
        let address = AddressRecord {
            street: "Oudegracht 1".into(),
            zipcode: "3511 AA".into(),
            city: "Utrecht".into(),
            country: "NL".into(),
        };
        save_address(&mut store, 3, &address).unwrap();
        assert_eq!(load_address(&store, 3), address);
        assert_eq!(load_address(&store, 4), AddressRecord::default());
    }

    #[test]
    fn test_delete_geometry_object_keeps_address() {
        let mut store = populated();
        delete_geometry_object(&mut store, 1).unwrap();
        assert!(!store.exists(1, fields::GEOMETRY));
        assert!(!store.exists(1, fields::LATITUDE));
        assert!(!store.exists(1, fields::LONGITUDE));
        for field in fields::ADDRESS_FIELDS {
            assert!(store.exists(1, field));
        }
    }

    #[test]
    fn test_delete_geometry_object_and_address() {
        let mut store = populated();
        delete_geometry_object_and_address(&mut store, 1).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_boxed_store_delegates() {
        let mut store: Box<dyn RecordStore> = Box::new(MemoryStore::new());
        store.set(9, fields::CITY, "Delft", true).unwrap();
        assert_eq!(store.get(9, fields::CITY).as_deref(), Some("Delft"));
        store.delete(9, fields::CITY).unwrap();
        assert!(!store.exists(9, fields::CITY));
    }
}
