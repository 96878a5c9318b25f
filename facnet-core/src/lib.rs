//! Facility network analysis over drivable road graphs.
//!
//! The engine resolves facilities onto a street graph and answers
//! least-length questions over it: single routes, closest-facility rankings
//! and origin-destination cost matrices.

pub mod algo;
pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;
pub use loading::{
    NetworkProvider, NetworkSource, NetworkSourceConfig, read_facilities, read_facilities_from_path,
};
pub use model::{Facility, FacilityStore, StreetGraph, StreetGraphBuilder};
pub use routing::{Route, path_lengths, shortest_path};

/// Index of a node inside a [`StreetGraph`]
pub type StreetNodeId = petgraph::graph::NodeIndex;

/// Index of a directed edge inside a [`StreetGraph`]
pub type StreetEdgeId = petgraph::graph::EdgeIndex;

/// Edge and path length, metres
pub type Meters = f64;
