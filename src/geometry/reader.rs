//! Geometry reader: stored Feature -> display summary.

use geo::BoundingRect;
use serde::Deserialize;
use tracing::debug;

use super::types::{Coordinate, DisplaySummary, FeatureKind, MapDefaults, ReadOutcome};
use crate::store::{fields, RecordId, RecordStore};

/// A stored feature, read leniently so unsupported kinds can be named.
#[derive(Deserialize)]
struct StoredFeature {
    #[serde(rename = "type")]
    _kind: FeatureKind,
    #[serde(default)]
    geometry: Option<StoredGeometry>,
}

#[derive(Deserialize)]
struct StoredGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

/// Summarizes stored geometry for the map.
#[derive(Debug, Clone)]
pub struct GeometryReader {
    defaults: MapDefaults,
}

impl GeometryReader {
    pub fn new(defaults: MapDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &MapDefaults {
        &self.defaults
    }

    /// The summary for a record without a marker.
    pub fn empty_summary(&self) -> DisplaySummary {
        DisplaySummary {
            has_marker: false,
            center: self.defaults.center,
            zoom: self.defaults.zoom,
            markers: Vec::new(),
        }
    }

    pub fn summarize_record<S: RecordStore + ?Sized>(
        &self,
        store: &S,
        record: RecordId,
    ) -> Result<DisplaySummary, ReadOutcome> {
        let stored = store.get(record, fields::GEOMETRY);
        self.summarize(stored.as_deref())
    }

    /// Summarize a stored Feature. The center is the midpoint of the
    /// bounding box of all markers.
    pub fn summarize(&self, stored: Option<&str>) -> Result<DisplaySummary, ReadOutcome> {
        let Some(raw) = stored.filter(|s| !s.trim().is_empty()) else {
            return Ok(self.empty_summary());
        };

        let feature: StoredFeature = serde_json::from_str(raw)
            .map_err(|e| ReadOutcome::CorruptGeometry(e.to_string()))?;
        let Some(geometry) = feature.geometry else {
            debug!("feature has no geometry");
            return Ok(self.empty_summary());
        };

        let markers: Vec<Coordinate> = match geometry.kind.as_str() {
            "Point" => vec![parse_coordinates(geometry.coordinates)?],
            "MultiPoint" => parse_coordinates(geometry.coordinates)?,
            other => return Err(ReadOutcome::UnsupportedGeometryKind(other.to_string())),
        };

        let center = bounding_box_center(&markers).ok_or_else(|| {
            ReadOutcome::CorruptGeometry(format!("{} has no coordinates", geometry.kind))
        })?;

        Ok(DisplaySummary {
            has_marker: true,
            center,
            zoom: self.defaults.zoom,
            markers,
        })
    }
}

fn parse_coordinates<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, ReadOutcome> {
    serde_json::from_value(value).map_err(|e| ReadOutcome::CorruptGeometry(e.to_string()))
}

/// Midpoint of the axis-aligned bounding box; `None` when empty.
pub fn bounding_box_center(coordinates: &[Coordinate]) -> Option<Coordinate> {
    let points: geo::MultiPoint<f64> = coordinates.iter().copied().map(geo::Point::from).collect();
    points.bounding_rect().map(|rect| {
        let center = rect.center();
        Coordinate::new(center.x, center.y)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocoding::Offline;
    use crate::geometry::{GeometryResolver, Properties, ResolveInput};
    use crate::store::MemoryStore;
    use approx::assert_relative_eq;

    fn reader() -> GeometryReader {
        GeometryReader::new(MapDefaults {
            center: Coordinate::new(5.2913, 52.1326),
            zoom: 8,
        })
    }

    #[test]
    fn test_absent_geometry_uses_defaults() {
        let summary = reader().summarize(None).unwrap();
        assert!(!summary.has_marker);
        assert_eq!(summary.center, Coordinate::new(5.2913, 52.1326));
        assert_eq!(summary.zoom, 8);
        assert!(summary.markers.is_empty());

        assert_eq!(reader().summarize(Some("  ")).unwrap(), summary);
        let null_geometry = r#"{"type":"Feature","properties":{},"geometry":null}"#;
        assert_eq!(reader().summarize(Some(null_geometry)).unwrap(), summary);
    }

    #[test]
    fn test_point_summary() {
        let raw = r#"{"type":"Feature","properties":[],"geometry":{"type":"Point","coordinates":[4.75,52.0]}}"#;
        let summary = reader().summarize(Some(raw)).unwrap();
        assert!(summary.has_marker);
        assert_eq!(summary.center, Coordinate::new(4.75, 52.0));
        assert_eq!(summary.markers, vec![Coordinate::new(4.75, 52.0)]);
    }

    #[test]
    fn test_center_is_bounding_box_midpoint_not_mean() {
        let raw = r#"{"type":"Feature","properties":{},"geometry":{"type":"MultiPoint","coordinates":[[0,0],[1,0],[10,4]]}}"#;
        let summary = reader().summarize(Some(raw)).unwrap();
        // The mean would be (3.667, 1.333).
        assert_relative_eq!(summary.center.lon, 5.0);
        assert_relative_eq!(summary.center.lat, 2.0);
        assert_eq!(summary.markers.len(), 3);
    }

    #[test]
    fn test_polygon_is_unsupported() {
        let raw = r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}"#;
        assert_eq!(
            reader().summarize(Some(raw)),
            Err(ReadOutcome::UnsupportedGeometryKind("Polygon".into()))
        );
    }

    #[test]
    fn test_corrupt_values() {
        let cases = [
            "{not json",
            r#"{"type":"FeatureCollection","features":[]}"#,
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":"here"}}"#,
            r#"{"type":"Feature","geometry":{"type":"Point"}}"#,
            r#"{"type":"Feature","geometry":{"type":"MultiPoint","coordinates":[]}}"#,
        ];
        for raw in cases {
            assert!(
                matches!(reader().summarize(Some(raw)), Err(ReadOutcome::CorruptGeometry(_))),
                "{} should be corrupt",
                raw
            );
        }
    }

    #[test]
    fn test_bounding_box_center_empty() {
        assert!(bounding_box_center(&[]).is_none());
    }

    #[test]
    fn test_resolve_then_summarize_round_trip() {
        let resolver = GeometryResolver::new(Offline);
        let mut store = MemoryStore::new();
        resolver
            .resolve(
                &mut store,
                10,
                ResolveInput::Markers(
                    r#"[{"lat":52.1,"lng":5.0},{"lat":52.1,"lng":5.0},{"lat":51.9,"lng":4.8}]"#.into(),
                ),
                Properties::new(),
            )
            .unwrap();

        let summary = reader().summarize_record(&store, 10).unwrap();
        assert!(summary.has_marker);
        assert_eq!(
            summary.markers,
            vec![Coordinate::new(5.0, 52.1), Coordinate::new(4.8, 51.9)]
        );
        assert_relative_eq!(summary.center.lon, 4.9, epsilon = 1e-12);
        assert_relative_eq!(summary.center.lat, 52.0, epsilon = 1e-12);
    }

    #[test]
    fn test_summarize_missing_record() {
        let store = MemoryStore::new();
        let summary = reader().summarize_record(&store, 99).unwrap();
        assert!(!summary.has_marker);
    }
}
