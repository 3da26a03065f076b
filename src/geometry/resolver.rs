//! Geometry resolver: editor input -> canonical Feature.
//!
//! Address flow:  persist address → geocode → Point(lon, lat) → store
//!                (miss: drop geometry + lat/lon, keep address text)
//! Marker flow:   parse → clear address/geometry → dedup → Point | MultiPoint → store

use tracing::{debug, info, warn};

use super::markers;
use super::types::{
    AddressRecord, Coordinate, EditorForm, Feature, Geometry, Properties, ResolutionOutcome,
    ResolveInput,
};
use crate::geocoding::Geocoder;
use crate::store::{self, fields, RecordId, RecordStore, StoreError};

/// Resolves editor input into a stored `Feature`.
pub struct GeometryResolver<G> {
    geocoder: G,
}

impl<G: Geocoder> GeometryResolver<G> {
    pub fn new(geocoder: G) -> Self {
        Self { geocoder }
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn into_geocoder(self) -> G {
        self.geocoder
    }

    /// Resolve a raw editor form. Unknown modes are a no-op.
    pub fn resolve_form<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        record: RecordId,
        form: EditorForm,
        properties: Properties,
    ) -> Result<Feature, ResolutionOutcome> {
        let mode = form.mode.clone();
        match form.into_input() {
            Some(input) => self.resolve(store, record, input, properties),
            None => {
                debug!(record, mode = %mode, "form carries no resolvable input");
                Err(ResolutionOutcome::NoOp)
            }
        }
    }

    /// Resolve input into a Feature and store it as the record's geometry,
    /// replacing any previous one.
    pub fn resolve<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        record: RecordId,
        input: ResolveInput,
        properties: Properties,
    ) -> Result<Feature, ResolutionOutcome> {
        let geometry = match input {
            ResolveInput::Address(address) => self.resolve_address(store, record, &address)?,
            ResolveInput::Markers(payload) => resolve_markers(store, record, &payload)?,
        };

        let feature = Feature::new(geometry, properties);
        let json = feature.to_json().map_err(StoreError::from)?;
        store.set(record, fields::GEOMETRY, &json, true)?;

        info!(
            record,
            kind = feature.geometry.kind(),
            points = feature.geometry.coordinates().len(),
            "stored location geometry"
        );
        Ok(feature)
    }

    /// Drop geometry and address for a record whose editor left marker mode.
    pub fn clear<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        record: RecordId,
    ) -> Result<(), StoreError> {
        info!(record, "clearing location geometry and address");
        store::delete_geometry_object_and_address(store, record)
    }

    fn resolve_address<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        record: RecordId,
        address: &AddressRecord,
    ) -> Result<Geometry, ResolutionOutcome> {
        // Typed text survives whatever the geocoder says.
        store::save_address(store, record, address)?;

        let query = address.query();
        let found = if address.is_blank() {
            debug!(record, "address is blank; skipping geocoder");
            None
        } else {
            match self.geocoder.lookup(&query) {
                Ok(point) => Some(point),
                Err(e) => {
                    warn!(record, query = %query, error = %e, "geocoding failed");
                    None
                }
            }
        };

        let Some(point) = found else {
            store::delete_geometry_object(store, record)?;
            return Err(ResolutionOutcome::GeocodeNotFound { query });
        };

        store.set(record, fields::LATITUDE, &point.latitude.to_string(), true)?;
        store.set(record, fields::LONGITUDE, &point.longitude.to_string(), true)?;

        Ok(Geometry::Point {
            coordinates: Coordinate::new(point.longitude, point.latitude),
        })
    }
}

fn resolve_markers<S: RecordStore + ?Sized>(
    store: &mut S,
    record: RecordId,
    payload: &str,
) -> Result<Geometry, ResolutionOutcome> {
    let parsed = markers::parse_markers(payload);
    if parsed.is_empty() {
        debug!(record, "marker payload holds no coordinates");
        return Err(ResolutionOutcome::NoOp);
    }

    // Marker and address storage are mutually exclusive.
    store::delete_geometry_object_and_address(store, record)?;

    let received = parsed.len();
    let unique = markers::dedup(parsed);
    if unique.len() < received {
        debug!(record, received, unique = unique.len(), "dropped duplicate markers");
    }

    Geometry::from_coordinates(unique).ok_or(ResolutionOutcome::NoOp)
}
