//! This module is responsible for loading data from various sources
//! (facility tables, OSM extracts, the Overpass API) and for keeping
//! one road network per place for the rest of the session.

mod config;
mod facilities;
pub mod osm;
mod overpass;
mod provider;

pub use config::{NetworkSourceConfig, OverpassConfig};
pub use facilities::{read_facilities, read_facilities_from_path};
pub use osm::OsmPbfSource;
pub use overpass::OverpassSource;
pub use provider::{NetworkProvider, NetworkSource};
