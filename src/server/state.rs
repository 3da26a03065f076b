use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::geocoding::Geocoder;
use crate::geometry::{GeometryReader, GeometryResolver};
use crate::store::RecordStore;

pub type SharedStore = Box<dyn RecordStore + Send>;
pub type SharedGeocoder = Box<dyn Geocoder + Send + Sync>;

pub struct AppState {
    pub store: Mutex<SharedStore>,
    pub resolver: GeometryResolver<SharedGeocoder>,
    pub reader: GeometryReader,
}

impl AppState {
    pub fn new(store: SharedStore, geocoder: SharedGeocoder, reader: GeometryReader) -> Self {
        Self {
            store: Mutex::new(store),
            resolver: GeometryResolver::new(geocoder),
            reader,
        }
    }

    /// The store stays usable after a panicking request; each write is
    /// complete on its own.
    pub fn lock_store(&self) -> MutexGuard<'_, SharedStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
