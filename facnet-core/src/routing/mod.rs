//! Node resolution and least-length path search
//!
//! Edge weights are segment lengths. Dijkstra's algorithm is only correct
//! for non-negative weights; [`StreetGraphBuilder`](crate::StreetGraphBuilder)
//! refuses anything else, and the planner relies on that without checking.

pub mod dijkstra;
mod route;

use petgraph::graph::NodeIndex;

pub use dijkstra::dijkstra_path_lengths as path_lengths;
pub use route::Route;

use crate::{Error, model::StreetGraph};

/// Snaps a WGS84 position to the nearest street node.
///
/// Repeated calls with the same graph and coordinates return the same node;
/// equidistant nodes resolve to the lowest index.
pub fn nearest_node(graph: &StreetGraph, latitude: f64, longitude: f64) -> Result<NodeIndex, Error> {
    graph
        .nearest_node(latitude, longitude)
        .map(|(node, _)| node)
}

/// Least-length route from `origin` to `destination`.
///
/// Equal-length alternatives are decided by expansion order (cheapest
/// first, then lowest node index), which is stable for an unchanged graph.
///
/// # Errors
///
/// [`Error::InvalidNodeIndex`] if either node is not in the graph,
/// [`Error::NoPathFound`] if `destination` is unreachable from `origin`.
pub fn shortest_path(
    graph: &StreetGraph,
    origin: NodeIndex,
    destination: NodeIndex,
) -> Result<Route, Error> {
    if !graph.contains_node(origin) || !graph.contains_node(destination) {
        return Err(Error::InvalidNodeIndex);
    }

    if origin == destination {
        return Ok(Route::stationary(origin));
    }

    log::trace!(
        "Searching path {} -> {}",
        origin.index(),
        destination.index()
    );

    dijkstra::dijkstra_tree(graph, origin, Some(destination))
        .route_to(destination)
        .ok_or(Error::NoPathFound {
            from: origin,
            to: destination,
        })
}
