//! Origin-destination cost matrices
//!
//! Every origin gets exactly one search; routes to all of its destinations
//! are read off the same shortest-path tree.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{BatchPolicy, routes_from};
use crate::{Error, Facility, Meters, StreetGraph, routing::Route};

/// One row of a cost matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMatrixEntry {
    pub origin: String,
    pub destination: String,
    /// Route length in metres
    pub length: Meters,
}

/// Reachable origin-destination pair with its route
#[derive(Debug, Clone)]
pub struct OdRoute<'a> {
    pub origin: &'a Facility,
    pub destination: &'a Facility,
    pub route: Route,
}

impl OdRoute<'_> {
    pub fn entry(&self) -> CostMatrixEntry {
        CostMatrixEntry {
            origin: self.origin.name.clone(),
            destination: self.destination.name.clone(),
            length: self.route.length(),
        }
    }
}

/// Routes from `origin` to each destination, in destination input order.
///
/// A destination that snaps to the origin's node gets a zero-length route.
/// Unreachable destinations follow `policy`.
pub fn od_routes<'a>(
    graph: &StreetGraph,
    origin: &'a Facility,
    destinations: &[&'a Facility],
    policy: BatchPolicy,
) -> Result<Vec<OdRoute<'a>>, Error> {
    let routes = routes_from(graph, origin, destinations, policy, |_| false)?
        .into_iter()
        .map(|(destination, route)| OdRoute {
            origin,
            destination,
            route,
        })
        .collect();
    Ok(routes)
}

/// Single-origin cost matrix, one entry per reachable destination
pub fn od_matrix(
    graph: &StreetGraph,
    origin: &Facility,
    destinations: &[&Facility],
    policy: BatchPolicy,
) -> Result<Vec<CostMatrixEntry>, Error> {
    Ok(od_routes(graph, origin, destinations, policy)?
        .iter()
        .map(OdRoute::entry)
        .collect())
}

/// Many-to-many cost matrix, origin-major.
///
/// Entries for the first origin come first, each origin's entries in
/// destination input order.
pub fn od_cost_matrix(
    graph: &StreetGraph,
    origins: &[&Facility],
    destinations: &[&Facility],
    policy: BatchPolicy,
) -> Result<Vec<CostMatrixEntry>, Error> {
    let matrix = origins
        .iter()
        .map(|origin| od_matrix(graph, origin, destinations, policy))
        .flatten_ok()
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "Cost matrix {}x{}: {} reachable pairs",
        origins.len(),
        destinations.len(),
        matrix.len()
    );

    Ok(matrix)
}
