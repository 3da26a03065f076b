//! Core types for the geometry subsystem.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::store::StoreError;

/// Free-form feature properties, passed through unchanged.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// A longitude/latitude pair. Serialized GeoJSON-style as `[lon, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = String;

    /// Positions may carry an altitude as a third element; it is dropped.
    fn try_from(position: Vec<f64>) -> Result<Self, Self::Error> {
        match position.as_slice() {
            [lon, lat, ..] => Ok(Self::new(*lon, *lat)),
            _ => Err(format!(
                "position needs at least 2 elements, got {}",
                position.len()
            )),
        }
    }
}

impl From<Coordinate> for geo::Point<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Point::new(c.lon, c.lat)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lon, self.lat)
    }
}

/// The geometry kinds the resolver produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Coordinate },
    MultiPoint { coordinates: Vec<Coordinate> },
}

impl Geometry {
    /// Collapse a deduplicated coordinate list into the smallest geometry
    /// that holds it. Returns `None` for an empty list.
    pub fn from_coordinates(mut coordinates: Vec<Coordinate>) -> Option<Self> {
        match coordinates.len() {
            0 => None,
            1 => Some(Self::Point {
                coordinates: coordinates.remove(0),
            }),
            _ => Some(Self::MultiPoint { coordinates }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point { .. } => "Point",
            Self::MultiPoint { .. } => "MultiPoint",
        }
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        match self {
            Self::Point { coordinates } => std::slice::from_ref(coordinates),
            Self::MultiPoint { coordinates } => coordinates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Feature,
}

/// A geometry wrapped with properties; the single stored value of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: FeatureKind,
    #[serde(default, deserialize_with = "properties_or_empty_list")]
    pub properties: Properties,
    pub geometry: Geometry,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            kind: FeatureKind::Feature,
            properties,
            geometry,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Older stored features encode empty properties as `[]`.
pub(crate) fn properties_or_empty_list<'de, D>(deserializer: D) -> Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Array(items) if items.is_empty() => Ok(Properties::new()),
        serde_json::Value::Null => Ok(Properties::new()),
        other => Err(de::Error::custom(format!(
            "expected a properties object, got {}",
            other
        ))),
    }
}

/// The four free-text address fields an editor types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub street: String,
    pub zipcode: String,
    pub city: String,
    pub country: String,
}

impl AddressRecord {
    /// Geocoding query: street, zip, city, country joined by single spaces.
    pub fn query(&self) -> String {
        [
            self.street.as_str(),
            self.zipcode.as_str(),
            self.city.as_str(),
            self.country.as_str(),
        ]
        .join(" ")
    }

    pub fn is_blank(&self) -> bool {
        self.query().trim().is_empty()
    }
}

/// Editor input, one variant per mode.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveInput {
    Address(AddressRecord),
    /// JSON array of `{"lat": .., "lng": ..}` objects.
    Markers(String),
}

/// The raw location form as posted by the editor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditorForm {
    pub mode: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub coordinates: Option<String>,
}

impl EditorForm {
    /// Map the posted mode onto a typed input. Unknown modes, and marker
    /// mode without a payload, yield `None`.
    pub fn into_input(self) -> Option<ResolveInput> {
        match self.mode.trim() {
            "address" => Some(ResolveInput::Address(AddressRecord {
                street: self.street,
                zipcode: self.zipcode,
                city: self.city,
                country: self.country,
            })),
            "marker" => self.coordinates.map(ResolveInput::Markers),
            _ => None,
        }
    }
}

/// Map state used when a record has nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapDefaults {
    pub center: Coordinate,
    pub zoom: u8,
}

/// What the presentation layer needs to draw a record's location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySummary {
    pub has_marker: bool,
    pub center: Coordinate,
    pub zoom: u8,
    pub markers: Vec<Coordinate>,
}

/// Why a resolution stored no geometry.
#[derive(Debug, Error)]
pub enum ResolutionOutcome {
    #[error("no geometry change requested")]
    NoOp,
    #[error("address could not be geocoded: '{query}'")]
    GeocodeNotFound { query: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a stored geometry could not be summarized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadOutcome {
    #[error("geometry kind '{0}' is not displayed on the map")]
    UnsupportedGeometryKind(String),
    #[error("stored geometry is corrupt: {0}")]
    CorruptGeometry(String),
}
