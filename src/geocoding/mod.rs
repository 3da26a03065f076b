//! Address geocoding.
//!
//! The resolver depends only on the `Geocoder` trait; `Nominatim` is the HTTP
//! implementation, `Offline` never matches anything.

pub mod nominatim;

use std::sync::Arc;
use thiserror::Error;

pub use nominatim::Nominatim;

/// A geocoder's best match, in the service's latitude-first order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeocodedPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no match for '{0}'")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid geocoder response: {0}")]
    InvalidResponse(String),
}

/// Resolves a free-text address to its single best match.
pub trait Geocoder {
    fn lookup(&self, query: &str) -> Result<GeocodedPoint, GeocodeError>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn lookup(&self, query: &str) -> Result<GeocodedPoint, GeocodeError> {
        (**self).lookup(query)
    }
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn lookup(&self, query: &str) -> Result<GeocodedPoint, GeocodeError> {
        (**self).lookup(query)
    }
}

impl<G: Geocoder + ?Sized> Geocoder for Arc<G> {
    fn lookup(&self, query: &str) -> Result<GeocodedPoint, GeocodeError> {
        (**self).lookup(query)
    }
}

/// Geocoder for offline use: every lookup is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl Geocoder for Offline {
    fn lookup(&self, query: &str) -> Result<GeocodedPoint, GeocodeError> {
        Err(GeocodeError::NotFound(query.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::sync::Mutex;

    /// Answers every query with a fixed result and records the queries.
    pub struct StubGeocoder {
        answer: Option<GeocodedPoint>,
        queries: Mutex<Vec<String>>,
    }

    impl StubGeocoder {
        pub fn found(latitude: f64, longitude: f64) -> Self {
            Self {
                answer: Some(GeocodedPoint {
                    latitude,
                    longitude,
                }),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn not_found() -> Self {
            Self {
                answer: None,
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl Geocoder for StubGeocoder {
        fn lookup(&self, query: &str) -> Result<GeocodedPoint, GeocodeError> {
            self.queries.lock().unwrap().push(query.to_string());
            self.answer
                .ok_or_else(|| GeocodeError::NotFound(query.to_string()))
        }
    }
}
