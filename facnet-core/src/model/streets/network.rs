//! Street graph with a spatial index for node snapping
//!
//! Node positions are indexed in a local equirectangular projection centred
//! on the mean latitude of the graph, so nearest-node queries compare plain
//! Euclidean distances in metres. The projection is fixed when the graph is
//! built and used for every query against it.

use geo::{Distance, Haversine, Point};
use petgraph::{
    Directed,
    graph::{DiGraph, EdgeIndex, Edges, NodeIndex},
};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use super::components::{StreetEdge, StreetNode};
use crate::{Error, Meters};

/// Mean Earth radius used by the projection, metres
const EARTH_RADIUS: f64 = 6_371_008.8;

/// Candidates closer than this to the best distance count as tied, metres
const TIE_TOLERANCE: Meters = 1e-6;

/// Node position in projected metres, stored in the R-tree
#[derive(Debug, Clone, Copy)]
pub struct IndexedPoint {
    position: [f64; 2],
    node: NodeIndex,
}

impl IndexedPoint {
    pub fn node(&self) -> NodeIndex {
        self.node
    }
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone, Copy)]
struct LocalProjection {
    cos_ref_lat: f64,
}

impl LocalProjection {
    fn centred_on(mean_latitude: f64) -> Self {
        Self {
            cos_ref_lat: mean_latitude.to_radians().cos(),
        }
    }

    fn project(self, latitude: f64, longitude: f64) -> [f64; 2] {
        [
            EARTH_RADIUS * longitude.to_radians() * self.cos_ref_lat,
            EARTH_RADIUS * latitude.to_radians(),
        ]
    }
}

/// Immutable drivable road graph for one place
#[derive(Debug, Clone)]
pub struct StreetGraph {
    pub(crate) graph: DiGraph<StreetNode, StreetEdge>,
    rtree: RTree<IndexedPoint>,
    projection: LocalProjection,
}

impl StreetGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        node.index() < self.graph.node_count()
    }

    pub fn node(&self, node: NodeIndex) -> Option<&StreetNode> {
        self.graph.node_weight(node)
    }

    pub fn edge(&self, edge: EdgeIndex) -> Option<&StreetEdge> {
        self.graph.edge_weight(edge)
    }

    pub fn edge_endpoints(&self, edge: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(edge)
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Outgoing segments of `node`
    pub fn edges(&self, node: NodeIndex) -> Edges<'_, StreetEdge, Directed> {
        self.graph.edges(node)
    }

    /// Nearest node to a WGS84 position, with its distance in metres.
    ///
    /// Equidistant candidates resolve to the lowest node index.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyGraph`] when the graph has no nodes,
    /// [`Error::InvalidData`] for non-finite coordinates.
    pub fn nearest_node(&self, latitude: f64, longitude: f64) -> Result<(NodeIndex, Meters), Error> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(Error::InvalidData(format!(
                "Cannot snap non-finite coordinates ({latitude}, {longitude})"
            )));
        }

        let query = self.projection.project(latitude, longitude);
        let mut candidates = self.rtree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_2) = candidates.next().ok_or(Error::EmptyGraph)?;
        let best = best_2.sqrt();

        // projection rounding must not decide a tie
        let node = candidates
            .take_while(|(_, distance_2)| distance_2.sqrt() - best <= TIE_TOLERANCE)
            .map(|(point, _)| point.node)
            .fold(first.node, std::cmp::min);

        Ok((node, best))
    }
}

/// Incremental construction of a [`StreetGraph`]
#[derive(Debug, Default)]
pub struct StreetGraphBuilder {
    graph: DiGraph<StreetNode, StreetEdge>,
}

impl StreetGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Adds a synthetic node, indices are assigned sequentially from 0
    pub fn add_node(&mut self, latitude: f64, longitude: f64) -> NodeIndex {
        self.graph.add_node(StreetNode {
            osm_id: None,
            geometry: Point::new(longitude, latitude),
        })
    }

    pub fn add_osm_node(&mut self, osm_id: i64, latitude: f64, longitude: f64) -> NodeIndex {
        self.graph.add_node(StreetNode {
            osm_id: Some(osm_id),
            geometry: Point::new(longitude, latitude),
        })
    }

    pub fn node_position(&self, node: NodeIndex) -> Option<Point<f64>> {
        self.graph.node_weight(node).map(|n| n.geometry)
    }

    /// Adds a directed segment `from -> to`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidNodeIndex`] for unknown endpoints and
    /// [`Error::InvalidData`] for negative or non-finite lengths.
    pub fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        length: Meters,
    ) -> Result<EdgeIndex, Error> {
        self.push_edge(from, to, length, None)
    }

    pub fn add_way_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        length: Meters,
        way_id: i64,
    ) -> Result<EdgeIndex, Error> {
        self.push_edge(from, to, length, Some(way_id))
    }

    /// Two-way road: one directed segment each way
    pub fn add_road(&mut self, a: NodeIndex, b: NodeIndex, length: Meters) -> Result<(), Error> {
        self.add_edge(a, b, length)?;
        self.add_edge(b, a, length)?;
        Ok(())
    }

    fn push_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        length: Meters,
        way_id: Option<i64>,
    ) -> Result<EdgeIndex, Error> {
        let node_count = self.graph.node_count();
        if from.index() >= node_count || to.index() >= node_count {
            return Err(Error::InvalidNodeIndex);
        }
        if !length.is_finite() || length < 0.0 {
            return Err(Error::InvalidData(format!(
                "Edge length must be finite and non-negative, got {length}"
            )));
        }

        Ok(self.graph.add_edge(from, to, StreetEdge { length, way_id }))
    }

    /// Freezes the graph and bulk-loads the spatial index
    pub fn build(self) -> StreetGraph {
        let graph = self.graph;

        #[allow(clippy::cast_precision_loss)]
        let mean_latitude = if graph.node_count() == 0 {
            0.0
        } else {
            graph.node_weights().map(|n| n.geometry.y()).sum::<f64>() / graph.node_count() as f64
        };
        let projection = LocalProjection::centred_on(mean_latitude);

        let points = graph
            .node_indices()
            .map(|node| {
                let geometry = graph[node].geometry;
                IndexedPoint {
                    position: projection.project(geometry.y(), geometry.x()),
                    node,
                }
            })
            .collect();

        StreetGraph {
            graph,
            rtree: RTree::bulk_load(points),
            projection,
        }
    }
}

/// Great-circle length of a straight segment, metres
pub(crate) fn segment_length(from: Point<f64>, to: Point<f64>) -> Meters {
    Haversine.distance(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (StreetGraph, [NodeIndex; 3]) {
        let mut builder = StreetGraphBuilder::new();
        let a = builder.add_node(-1.2900, 36.8200);
        let b = builder.add_node(-1.2900, 36.8300);
        let c = builder.add_node(-1.3000, 36.8250);
        builder.add_road(a, b, 1_100.0).unwrap();
        builder.add_road(b, c, 1_250.0).unwrap();
        builder.add_edge(c, a, 1_250.0).unwrap();
        (builder.build(), [a, b, c])
    }

    #[test]
    fn build_keeps_counts() {
        let (graph, [a, _, c]) = triangle();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(graph.edges(a).count(), 1);
        assert_eq!(graph.edges(c).count(), 2);
    }

    #[test]
    fn nearest_node_picks_closest() {
        let (graph, [a, b, c]) = triangle();
        assert_eq!(graph.nearest_node(-1.2901, 36.8201).unwrap().0, a);
        assert_eq!(graph.nearest_node(-1.2890, 36.8310).unwrap().0, b);
        assert_eq!(graph.nearest_node(-1.3100, 36.8250).unwrap().0, c);
    }

    #[test]
    fn nearest_node_distance_is_metres() {
        let (graph, [a, ..]) = triangle();
        let (node, distance) = graph.nearest_node(-1.2900, 36.8200).unwrap();
        assert_eq!(node, a);
        assert!(distance < 1e-6);

        // ~0.001 degree of latitude is ~111 m
        let (_, distance) = graph.nearest_node(-1.2890, 36.8200).unwrap();
        assert!((distance - 111.2).abs() < 1.0, "got {distance}");
    }

    #[test]
    fn equidistant_nodes_resolve_to_lowest_index() {
        let mut builder = StreetGraphBuilder::new();
        let east = builder.add_node(0.0, 0.001);
        let west = builder.add_node(0.0, -0.001);
        let graph = builder.build();
        assert!(east < west);
        assert_eq!(graph.nearest_node(0.0, 0.0).unwrap().0, east);
    }

    #[test]
    fn mirrored_nodes_tie_despite_rounding() {
        for step in 1..200 {
            let offset = f64::from(step) * 1e-4;
            let mut builder = StreetGraphBuilder::new();
            builder.add_node(-1.2, 36.8);
            let north = builder.add_node(-1.3 + offset, 36.82);
            let south = builder.add_node(-1.3 - offset, 36.82);
            let graph = builder.build();

            let (node, _) = graph.nearest_node(-1.3, 36.82).unwrap();
            assert!(north < south);
            assert_eq!(node, north, "offset {offset}");
        }
    }

    #[test]
    fn near_but_distinct_nodes_are_not_tied() {
        let mut builder = StreetGraphBuilder::new();
        let far = builder.add_node(0.0, 0.000_02);
        let near = builder.add_node(0.0, -0.000_01);
        let graph = builder.build();
        assert_eq!(graph.nearest_node(0.0, 0.0).unwrap().0, near);
        assert!(far < near);
    }

    #[test]
    fn empty_graph_cannot_resolve() {
        let graph = StreetGraphBuilder::new().build();
        assert!(graph.is_empty());
        assert!(matches!(graph.nearest_node(0.0, 0.0), Err(Error::EmptyGraph)));
    }

    #[test]
    fn single_node_always_resolves() {
        let mut builder = StreetGraphBuilder::new();
        let only = builder.add_node(10.0, 10.0);
        let graph = builder.build();
        assert_eq!(graph.nearest_node(-45.0, 170.0).unwrap().0, only);
    }

    #[test]
    fn invalid_edges_rejected() {
        let mut builder = StreetGraphBuilder::new();
        let a = builder.add_node(0.0, 0.0);
        let b = builder.add_node(0.0, 1.0);
        assert!(matches!(
            builder.add_edge(a, NodeIndex::new(7), 1.0),
            Err(Error::InvalidNodeIndex)
        ));
        assert!(matches!(builder.add_edge(a, b, -1.0), Err(Error::InvalidData(_))));
        assert!(matches!(builder.add_edge(a, b, f64::NAN), Err(Error::InvalidData(_))));
        assert!(builder.add_edge(a, b, 0.0).is_ok());
    }

    #[test]
    fn segment_length_is_haversine() {
        let length = segment_length(Point::new(36.82, -1.29), Point::new(36.83, -1.29));
        assert!((length - 1_112.0).abs() < 5.0, "got {length}");
    }
}
