//! OpenStreetMap Nominatim geocoder.

use serde::Deserialize;
use tracing::debug;

use super::{GeocodeError, GeocodedPoint, Geocoder};
use crate::config::GeocoderSettings;

#[derive(Deserialize, Debug, Clone)]
struct NominatimResult {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Geocodes addresses through a Nominatim `/search` endpoint.
pub struct Nominatim {
    agent: ureq::Agent,
    search_url: String,
    user_agent: String,
}

impl Nominatim {
    pub fn new(settings: &GeocoderSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(settings.timeout)
            .build();
        Self {
            agent,
            search_url: format!("{}/search", settings.base_url.trim_end_matches('/')),
            user_agent: settings.user_agent.clone(),
        }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

impl Geocoder for Nominatim {
    fn lookup(&self, query: &str) -> Result<GeocodedPoint, GeocodeError> {
        debug!(query, url = %self.search_url, "nominatim lookup");

        let response = self
            .agent
            .get(&self.search_url)
            .set("User-Agent", &self.user_agent)
            .query("q", query)
            .query("format", "json")
            .query("addressdetails", "1")
            .query("limit", "1")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => GeocodeError::Network(format!("HTTP {}", code)),
                other => GeocodeError::Network(other.to_string()),
            })?;

        let results: Vec<NominatimResult> = response
            .into_json()
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

        best_match(query, &results)
    }
}

/// Take the first result; Nominatim orders by relevance.
fn best_match(query: &str, results: &[NominatimResult]) -> Result<GeocodedPoint, GeocodeError> {
    let top = results
        .first()
        .ok_or_else(|| GeocodeError::NotFound(query.to_string()))?;

    let parse = |raw: &str, axis: &str| {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| GeocodeError::InvalidResponse(format!("bad {} '{}'", axis, raw)))
    };
    let latitude = parse(&top.lat, "lat")?;
    let longitude = parse(&top.lon, "lon")?;

    debug!(
        query,
        latitude,
        longitude,
        display_name = top.display_name.as_deref().unwrap_or(""),
        "nominatim match"
    );
    Ok(GeocodedPoint {
        latitude,
        longitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn results(json: &str) -> Vec<NominatimResult> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_best_match_takes_first() {
        let r = results(
            r#"[
                {"lat":"52.0907","lon":"5.1214","display_name":"Utrecht, Nederland","importance":0.7},
                {"lat":"40.0","lon":"-75.0","display_name":"Utrecht, US"}
            ]"#,
        );
        let point = best_match("Utrecht", &r).unwrap();
        assert_eq!(point.latitude, 52.0907);
        assert_eq!(point.longitude, 5.1214);
    }

    #[test]
    fn test_best_match_empty_is_not_found() {
        assert!(matches!(
            best_match("nowhere", &[]),
            Err(GeocodeError::NotFound(q)) if q == "nowhere"
        ));
    }

    #[test]
    fn test_best_match_rejects_unparsable_coordinates() {
        let r = results(r#"[{"lat":"","lon":"5.1"}]"#);
        assert!(matches!(
            best_match("x", &r),
            Err(GeocodeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_search_url_from_settings() {
        let settings = GeocoderSettings {
            base_url: "http://localhost:8080/".into(),
            user_agent: "test".into(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(
            Nominatim::new(&settings).search_url(),
            "http://localhost:8080/search"
        );
    }

    #[test]
    fn test_unreachable_service_is_network_error() {
        // Port 9 (discard) is closed on test hosts; the connection is refused.
        let settings = GeocoderSettings {
            base_url: "http://127.0.0.1:9".into(),
            user_agent: "test".into(),
            timeout: Duration::from_secs(2),
        };
        assert!(matches!(
            Nominatim::new(&settings).lookup("Utrecht"),
            Err(GeocodeError::Network(_))
        ));
    }
}
