//! Facility analyses built on the route planner

pub mod closest;
pub mod od_matrix;
pub mod placeholders;

use log::warn;
use petgraph::graph::NodeIndex;

use crate::{
    Error, Facility, StreetGraph,
    routing::{Route, dijkstra::dijkstra_tree, nearest_node},
};

/// What a batch analysis does with a pair that has no path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Leave the pair out and carry on
    #[default]
    Exclude,
    /// Fail the whole batch with the pair's error
    Strict,
}

/// Street node a facility snaps to
pub fn resolve_facility(graph: &StreetGraph, facility: &Facility) -> Result<NodeIndex, Error> {
    nearest_node(graph, facility.latitude, facility.longitude)
}

/// One search from `origin`, then a route to every target in input order.
///
/// Targets rejected by `skip` are left out silently; unreachable targets
/// follow `policy`.
pub(crate) fn routes_from<'a>(
    graph: &StreetGraph,
    origin: &Facility,
    targets: &[&'a Facility],
    policy: BatchPolicy,
    skip: impl Fn(&Facility) -> bool,
) -> Result<Vec<(&'a Facility, Route)>, Error> {
    let origin_node = resolve_facility(graph, origin)?;
    let tree = dijkstra_tree(graph, origin_node, None);

    let mut routes = Vec::with_capacity(targets.len());
    for &target in targets {
        if skip(target) {
            continue;
        }

        let target_node = resolve_facility(graph, target)?;
        if let Some(route) = tree.route_to(target_node) {
            routes.push((target, route));
            continue;
        }

        let error = Error::NoPathFound {
            from: tree.origin(),
            to: target_node,
        };
        match policy {
            BatchPolicy::Strict => return Err(error),
            BatchPolicy::Exclude => {
                warn!(
                    "Excluding '{}' -> '{}': {error}",
                    origin.name, target.name
                );
            }
        }
    }

    Ok(routes)
}
