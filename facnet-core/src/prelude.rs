// Re-export key components
pub use crate::algo::closest::{ClosestFacility, closest};
pub use crate::algo::od_matrix::{CostMatrixEntry, OdRoute, od_cost_matrix, od_matrix, od_routes};
pub use crate::algo::placeholders::{location_allocation, service_area, solve_vrp};
pub use crate::algo::{BatchPolicy, resolve_facility};
pub use crate::error::{AnalysisKind, Error};
pub use crate::loading::{
    NetworkProvider, NetworkSource, NetworkSourceConfig, OsmPbfSource, OverpassSource,
    read_facilities, read_facilities_from_path,
};
pub use crate::model::{Facility, FacilityStore, StreetGraph, StreetGraphBuilder};
pub use crate::routing::{Route, nearest_node, path_lengths, shortest_path};

// Core types for the street network
pub use crate::Meters;
pub use crate::StreetEdgeId;
pub use crate::StreetNodeId;
