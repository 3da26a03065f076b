//! Runtime settings, assembled by the CLI.

use std::path::PathBuf;
use std::time::Duration;

use crate::geometry::{Coordinate, MapDefaults};
use crate::store::JsonFileStore;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = concat!("location-geometry/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// Center of the Netherlands.
pub const DEFAULT_CENTER_LON: f64 = 5.2913;
pub const DEFAULT_CENTER_LAT: f64 = 52.1326;
pub const DEFAULT_ZOOM: u8 = 8;

#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store_path: PathBuf,
    pub geocoder: GeocoderSettings,
    /// Skip the network; every address lookup misses.
    pub offline: bool,
    pub map: MapDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: JsonFileStore::default_path(),
            geocoder: GeocoderSettings::default(),
            offline: false,
            map: MapDefaults {
                center: Coordinate::new(DEFAULT_CENTER_LON, DEFAULT_CENTER_LAT),
                zoom: DEFAULT_ZOOM,
            },
        }
    }
}
