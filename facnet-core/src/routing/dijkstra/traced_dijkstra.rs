use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::{
    graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

use super::state::State;
use crate::{Meters, model::StreetGraph, routing::Route};

/// Settled part of a single-source search, with the segment used to reach
/// every settled node
#[derive(Debug)]
pub(crate) struct ShortestPathTree {
    origin: NodeIndex,
    distances: HashMap<NodeIndex, Meters>,
    predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    settled: FixedBitSet,
}

impl ShortestPathTree {
    pub(crate) fn origin(&self) -> NodeIndex {
        self.origin
    }

    /// Final path length to `target`, `None` if the search never settled it
    pub(crate) fn length_to(&self, target: NodeIndex) -> Option<Meters> {
        if self.is_settled(target) {
            self.distances.get(&target).copied()
        } else {
            None
        }
    }

    /// Walks predecessors back from `target` to the origin
    pub(crate) fn route_to(&self, target: NodeIndex) -> Option<Route> {
        let length = self.length_to(target)?;

        let mut nodes = vec![target];
        let mut edges = Vec::new();
        let mut current = target;
        while current != self.origin {
            let &(prev, edge) = self.predecessors.get(&current)?;
            nodes.push(prev);
            edges.push(edge);
            current = prev;
        }
        nodes.reverse();
        edges.reverse();

        Some(Route {
            origin: self.origin,
            destination: target,
            nodes,
            edges,
            length,
        })
    }

    fn is_settled(&self, node: NodeIndex) -> bool {
        node.index() < self.settled.len() && self.settled.contains(node.index())
    }
}

/// Dijkstra's algorithm keeping predecessors for path reconstruction.
///
/// With a `target` the search stops as soon as the target is settled; the
/// path to it is identical to the one a full search would produce, because
/// a settled node's predecessor never changes afterwards.
pub(crate) fn dijkstra_tree(
    graph: &StreetGraph,
    start: NodeIndex,
    target: Option<NodeIndex>,
) -> ShortestPathTree {
    // Estimate capacity based on graph size
    let estimated_nodes = graph.node_count().min(1000);
    let mut distances: HashMap<NodeIndex, Meters> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> =
        HashMap::with_capacity(estimated_nodes);
    let mut settled = FixedBitSet::with_capacity(graph.node_count());
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    if graph.contains_node(start) {
        heap.push(State {
            cost: 0.0,
            node: start,
        });
        distances.insert(start, 0.0);
    }

    while let Some(State { cost, node }) = heap.pop() {
        if settled.put(node.index()) {
            continue;
        }

        if target == Some(node) {
            break;
        }

        for edge in graph.edges(node) {
            let next = edge.target();
            if settled.contains(next.index()) {
                continue;
            }
            let next_cost = cost + edge.weight().length;

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, (node, edge.id()));
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, (node, edge.id()));
                    }
                }
            }
        }
    }

    ShortestPathTree {
        origin: start,
        distances,
        predecessors,
        settled,
    }
}
