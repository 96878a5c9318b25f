mod regular_dijkstra;
mod state;
mod traced_dijkstra;

pub use regular_dijkstra::dijkstra_path_lengths;
pub(crate) use traced_dijkstra::dijkstra_tree;
