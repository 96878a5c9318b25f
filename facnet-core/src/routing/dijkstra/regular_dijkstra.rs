use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::{graph::NodeIndex, visit::EdgeRef};

use super::state::State;
use crate::{Meters, model::StreetGraph};

/// Dijkstra's algorithm over segment lengths
/// Returns a map of reached node indices to path lengths in metres
///
/// Nodes farther than `max_length` are left out of the result.
pub fn dijkstra_path_lengths(
    graph: &StreetGraph,
    start: NodeIndex,
    max_length: Option<Meters>,
) -> HashMap<NodeIndex, Meters> {
    let mut distances: HashMap<NodeIndex, Meters> = HashMap::new();
    let mut settled = FixedBitSet::with_capacity(graph.node_count());
    let mut heap = BinaryHeap::new();

    if !graph.contains_node(start) {
        return distances;
    }

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if settled.put(node.index()) {
            continue;
        }

        if let Some(max) = max_length {
            if cost > max {
                break;
            }
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
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    if let Some(max) = max_length {
        distances.retain(|_, cost| *cost <= max);
    }

    distances
}
