//! Analyses the engine accepts but has no solver for yet.
//!
//! Each entry point checks its inputs the same way a real solver would, so
//! malformed requests fail with the same errors they will fail with later,
//! and then reports [`Error::SolverUnavailable`]. None of them ever
//! produces a result.

use std::convert::Infallible;

use super::resolve_facility;
use crate::{
    Error, Facility, Meters, StreetGraph,
    error::AnalysisKind,
};

fn unavailable(kind: AnalysisKind) -> Result<Infallible, Error> {
    log::warn!("Requested {kind}, which has no solver");
    Err(Error::SolverUnavailable(kind))
}

/// Area reachable from `facility` within `cutoff` metres
pub fn service_area(
    graph: &StreetGraph,
    facility: &Facility,
    cutoff: Meters,
) -> Result<Infallible, Error> {
    if !cutoff.is_finite() || cutoff <= 0.0 {
        return Err(Error::InvalidData(format!(
            "Service area cutoff must be a positive length, got {cutoff}"
        )));
    }
    resolve_facility(graph, facility)?;
    unavailable(AnalysisKind::ServiceArea)
}

/// Routes for `vehicles` vehicles from `depot` covering every stop
pub fn solve_vrp(
    graph: &StreetGraph,
    depot: &Facility,
    stops: &[&Facility],
    vehicles: usize,
) -> Result<Infallible, Error> {
    if vehicles == 0 {
        return Err(Error::InvalidData(
            "Vehicle routing needs at least one vehicle".to_string(),
        ));
    }
    resolve_facility(graph, depot)?;
    for stop in stops {
        resolve_facility(graph, stop)?;
    }
    unavailable(AnalysisKind::VehicleRouting)
}

/// Choose `facilities_to_site` of the candidates to serve the demand points
pub fn location_allocation(
    graph: &StreetGraph,
    candidates: &[&Facility],
    demand: &[&Facility],
    facilities_to_site: usize,
) -> Result<Infallible, Error> {
    if facilities_to_site == 0 || facilities_to_site > candidates.len() {
        return Err(Error::InvalidData(format!(
            "Cannot site {facilities_to_site} of {} candidate facilities",
            candidates.len()
        )));
    }
    for facility in candidates.iter().chain(demand) {
        resolve_facility(graph, facility)?;
    }
    unavailable(AnalysisKind::LocationAllocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StreetGraphBuilder;

    fn tiny() -> StreetGraph {
        let mut builder = StreetGraphBuilder::new();
        let a = builder.add_node(0.0, 0.0);
        let b = builder.add_node(0.0, 0.01);
        builder.add_road(a, b, 1_000.0).unwrap();
        builder.build()
    }

    #[test]
    fn valid_requests_report_missing_solver() {
        let graph = tiny();
        let depot = Facility::new("Depot", 0.0, 0.0);
        let stop = Facility::new("Stop", 0.0, 0.01);

        assert!(matches!(
            service_area(&graph, &depot, 500.0),
            Err(Error::SolverUnavailable(AnalysisKind::ServiceArea))
        ));
        assert!(matches!(
            solve_vrp(&graph, &depot, &[&stop], 2),
            Err(Error::SolverUnavailable(AnalysisKind::VehicleRouting))
        ));
        assert!(matches!(
            location_allocation(&graph, &[&depot, &stop], &[&stop], 1),
            Err(Error::SolverUnavailable(AnalysisKind::LocationAllocation))
        ));
    }

    #[test]
    fn malformed_requests_fail_first() {
        let graph = tiny();
        let depot = Facility::new("Depot", 0.0, 0.0);

        assert!(matches!(
            service_area(&graph, &depot, -1.0),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            solve_vrp(&graph, &depot, &[], 0),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            location_allocation(&graph, &[&depot], &[], 3),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            service_area(&StreetGraphBuilder::new().build(), &depot, 500.0),
            Err(Error::EmptyGraph)
        ));
    }
}
