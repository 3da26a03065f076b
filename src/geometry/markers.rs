//! Marker payload parsing and deduplication.
//!
//! The map widget posts its markers as a JSON array of `{"lat", "lng"}`
//! objects. Depending on the widget version the values arrive as numbers or
//! as numeric strings.

use serde::Deserialize;
use tracing::warn;

use super::types::Coordinate;

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Many(Vec<serde_json::Value>),
    One(serde_json::Map<String, serde_json::Value>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Float(f64),
    Text(String),
}

impl Number {
    fn to_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Float(v) => *v,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Deserialize)]
struct RawMarker {
    lat: Option<Number>,
    lng: Option<Number>,
}

/// Parse a marker payload into (lon, lat) coordinates, in payload order.
///
/// Malformed JSON yields an empty list. Entries without a numeric `lat` and
/// `lng` are skipped.
pub fn parse_markers(payload: &str) -> Vec<Coordinate> {
    let entries = match serde_json::from_str::<Payload>(payload) {
        Ok(Payload::Many(entries)) => entries,
        Ok(Payload::One(entry)) => vec![serde_json::Value::Object(entry)],
        Err(e) => {
            warn!(error = %e, "marker payload is not valid JSON");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let coordinate = serde_json::from_value::<RawMarker>(entry)
                .ok()
                .and_then(|m| {
                    let lat = m.lat.as_ref()?.to_f64()?;
                    let lng = m.lng.as_ref()?.to_f64()?;
                    Some(Coordinate::new(lng, lat))
                });
            if coordinate.is_none() {
                warn!(index, "skipping marker without numeric lat/lng");
            }
            coordinate
        })
        .collect()
}

/// Drop repeated coordinates, keeping the first occurrence of each.
pub fn dedup(coordinates: Vec<Coordinate>) -> Vec<Coordinate> {
    let mut unique: Vec<Coordinate> = Vec::with_capacity(coordinates.len());
    for c in coordinates {
        if !unique.contains(&c) {
            unique.push(c);
        }
    }
    unique
}
