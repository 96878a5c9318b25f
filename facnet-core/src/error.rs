use std::fmt;

use thiserror::Error;

use crate::StreetNodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to fetch road network for '{place}': {reason}")]
    NetworkFetch { place: String, reason: String },
    #[error("Road network has no nodes to resolve against")]
    EmptyGraph,
    #[error("No path found from node {} to node {}", .from.index(), .to.index())]
    NoPathFound {
        from: StreetNodeId,
        to: StreetNodeId,
    },
    #[error("Facility not found: {0}")]
    FacilityNotFound(String),
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("{0} has no solver yet")]
    SolverUnavailable(AnalysisKind),
}

impl Error {
    pub fn network_fetch(place: &str, reason: impl fmt::Display) -> Self {
        Self::NetworkFetch {
            place: place.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NetworkFetch { .. } => "network_fetch",
            Self::EmptyGraph => "empty_graph",
            Self::NoPathFound { .. } => "no_path_found",
            Self::FacilityNotFound(_) => "facility_not_found",
            Self::InvalidNodeIndex => "invalid_node_index",
            Self::InvalidData(_) => "invalid_data",
            Self::IoError(_) => "io",
            Self::CsvError(_) => "csv",
            Self::GeoJsonError(_) => "geojson",
            Self::SolverUnavailable(_) => "solver_unavailable",
        }
    }
}

/// Analyses that accept network inputs but have no working solver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    ServiceArea,
    VehicleRouting,
    LocationAllocation,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ServiceArea => "Service-area analysis",
            Self::VehicleRouting => "Vehicle routing",
            Self::LocationAllocation => "Location-allocation",
        };
        f.write_str(name)
    }
}
