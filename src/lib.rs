//! Location geometry for editorial records.
//!
//! An editor describes a location either as a postal address or as one or
//! more map markers. This crate turns that input into a single canonical
//! GeoJSON `Feature` (Point or MultiPoint), persists it in a key/value record
//! store, and reads it back as a display summary (center + markers).

pub mod config;
pub mod geocoding;
pub mod geometry;
pub mod server;
pub mod store;
