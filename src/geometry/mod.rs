//! Geometry resolution subsystem.
//!
//! Turns editor input (address or markers) into a canonical `Feature`, and
//! stored features back into a `DisplaySummary`.

pub mod markers;
pub mod reader;
pub mod resolver;
pub mod types;

pub use reader::GeometryReader;
pub use resolver::GeometryResolver;
pub use types::{
    AddressRecord, Coordinate, DisplaySummary, EditorForm, Feature, Geometry, MapDefaults,
    Properties, ReadOutcome, ResolutionOutcome, ResolveInput,
};
