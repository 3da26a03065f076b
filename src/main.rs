use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use location_geometry::config::{self, GeocoderSettings, Settings};
use location_geometry::geocoding::{Nominatim, Offline};
use location_geometry::geometry::{
    Coordinate, EditorForm, GeometryReader, GeometryResolver, MapDefaults, Properties,
};
use location_geometry::server::{self, AppState, LocationResponse, SaveResponse, SharedGeocoder};
use location_geometry::store::{self, JsonFileStore, RecordId};

/// locgeo: location geometry for editorial records
///
/// Resolves an address or a set of map markers into a GeoJSON Point or
/// MultiPoint feature, stores it per record, and summarizes it for display.
///
/// Examples:
///   locgeo resolve 12 --mode address --street "Stationsplein 1" --city Utrecht --country NL
///   locgeo resolve 12 --mode marker --markers '[{"lat":52.1,"lng":5.0}]'
///   locgeo show 12
///   locgeo serve --port 8080
#[derive(Parser)]
#[command(name = "locgeo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Record store file. Defaults to ~/.locgeo/records.json.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Nominatim base URL.
    #[arg(long, global = true, default_value = config::DEFAULT_NOMINATIM_URL)]
    nominatim_url: String,

    /// User-Agent sent to the geocoder.
    #[arg(long, global = true, default_value = config::DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Geocoder request timeout in seconds.
    #[arg(long, global = true, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Map center longitude for records without a marker.
    #[arg(long, global = true, allow_hyphen_values = true, default_value_t = config::DEFAULT_CENTER_LON)]
    default_lon: f64,

    /// Map center latitude for records without a marker.
    #[arg(long, global = true, allow_hyphen_values = true, default_value_t = config::DEFAULT_CENTER_LAT)]
    default_lat: f64,

    /// Map zoom level.
    #[arg(long, global = true, default_value_t = config::DEFAULT_ZOOM)]
    default_zoom: u8,

    /// Offline mode: address lookups always miss.
    #[arg(long, global = true)]
    offline: bool,

    /// Debug logging (RUST_LOG overrides).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve editor input and store the resulting geometry.
    Resolve {
        record: RecordId,

        /// Input mode: "address" or "marker". Anything else changes nothing.
        #[arg(long)]
        mode: String,

        #[arg(long, default_value = "")]
        street: String,

        #[arg(long, default_value = "")]
        zip: String,

        #[arg(long, default_value = "")]
        city: String,

        #[arg(long, default_value = "")]
        country: String,

        /// Marker payload: JSON array of {"lat": .., "lng": ..} objects.
        #[arg(long)]
        markers: Option<String>,

        /// Feature property as key=value. JSON values are kept as JSON.
        #[arg(long = "property", value_parser = parse_property)]
        properties: Vec<(String, serde_json::Value)>,
    },
    /// Print the display summary of a record.
    Show { record: RecordId },
    /// Print the stored address fields of a record.
    Address { record: RecordId },
    /// Remove a record's geometry and address.
    Clear { record: RecordId },
    /// Serve the JSON HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, short = 'p', default_value_t = 8080)]
        port: u16,
    },
}

fn parse_property(s: &str) -> Result<(String, serde_json::Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("Property '{}' must look like key=value.", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Property '{}' has an empty key.", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.into()));
    Ok((key.to_string(), value))
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            store_path: self.store.clone().unwrap_or_else(JsonFileStore::default_path),
            geocoder: GeocoderSettings {
                base_url: self.nominatim_url.clone(),
                user_agent: self.user_agent.clone(),
                timeout: Duration::from_secs(self.timeout_secs),
            },
            offline: self.offline,
            map: MapDefaults {
                center: Coordinate::new(self.default_lon, self.default_lat),
                zoom: self.default_zoom,
            },
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn geocoder(settings: &Settings) -> SharedGeocoder {
    if settings.offline {
        Box::new(Offline)
    } else {
        Box::new(Nominatim::new(&settings.geocoder))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = cli.settings();
    debug!(store = %settings.store_path.display(), offline = settings.offline, "settings loaded");

    let mut records = JsonFileStore::open(settings.store_path.clone())?;
    let reader = GeometryReader::new(settings.map);
    let resolver = GeometryResolver::new(geocoder(&settings));

    match cli.command {
        Command::Resolve {
            record,
            mode,
            street,
            zip,
            city,
            country,
            markers,
            properties,
        } => {
            let form = EditorForm {
                mode,
                street,
                zipcode: zip,
                city,
                country,
                coordinates: markers,
            };
            let properties: Properties = properties.into_iter().collect();
            let outcome = resolver.resolve_form(&mut records, record, form, properties);
            print_json(&SaveResponse::from_resolution(outcome)?)?;
        }
        Command::Show { record } => {
            let outcome = reader.summarize_record(&records, record);
            print_json(&LocationResponse::from_read(&reader, record, outcome))?;
        }
        Command::Address { record } => {
            print_json(&store::load_address(&records, record))?;
        }
        Command::Clear { record } => {
            resolver.clear(&mut records, record)?;
            print_json(&SaveResponse::Cleared)?;
        }
        Command::Serve { host, port } => {
            let state = AppState::new(Box::new(records), resolver.into_geocoder(), reader);
            tokio::runtime::Runtime::new()
                .context("cannot start async runtime")?
                .block_on(server::start(&host, port, state))?;
        }
    }

    Ok(())
}
