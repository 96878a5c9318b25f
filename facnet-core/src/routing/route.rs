use geo::{Coord, LineString};
use geojson::{Feature, Geometry, GeometryValue};
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde_json::{Map, Value as JsonValue, json};

use crate::{Error, Meters, model::StreetGraph};

/// Least-length path between two street nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub(crate) origin: NodeIndex,
    pub(crate) destination: NodeIndex,
    pub(crate) nodes: Vec<NodeIndex>,
    pub(crate) edges: Vec<EdgeIndex>,
    pub(crate) length: Meters,
}

impl Route {
    /// Zero-length route that never leaves `node`
    pub(crate) fn stationary(node: NodeIndex) -> Self {
        Self {
            origin: node,
            destination: node,
            nodes: vec![node],
            edges: Vec::new(),
            length: 0.0,
        }
    }

    pub fn origin(&self) -> NodeIndex {
        self.origin
    }

    pub fn destination(&self) -> NodeIndex {
        self.destination
    }

    /// Visited nodes, origin first
    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    /// Traversed segments, one fewer than `nodes`
    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    /// Total length in metres
    pub fn length(&self) -> Meters {
        self.length
    }

    /// Sums the lengths of the traversed segments again, in path order
    pub fn recomputed_length(&self, graph: &StreetGraph) -> Result<Meters, Error> {
        self.edges.iter().try_fold(0.0, |total, &edge| {
            graph
                .edge(edge)
                .map(|segment| total + segment.length)
                .ok_or_else(|| {
                    Error::InvalidData(format!(
                        "Route segment {} is not part of the graph",
                        edge.index()
                    ))
                })
        })
    }

    /// Node positions as `(latitude, longitude)` pairs, origin first
    pub fn coordinates(&self, graph: &StreetGraph) -> Vec<(f64, f64)> {
        self.nodes
            .iter()
            .filter_map(|&node| graph.node(node))
            .map(|node| (node.latitude(), node.longitude()))
            .collect()
    }

    pub fn line_string(&self, graph: &StreetGraph) -> LineString<f64> {
        self.nodes
            .iter()
            .filter_map(|&node| graph.node(node))
            .map(|node| Coord::from(node.geometry))
            .collect()
    }

    /// Route geometry in `GeoJSON` lon/lat order.
    ///
    /// A route that never leaves its node is a `Point`; a `LineString` needs
    /// at least two positions.
    pub fn geometry(&self, graph: &StreetGraph) -> Option<Geometry> {
        let positions: Vec<[f64; 2]> = self
            .line_string(graph)
            .coords()
            .map(|c| [c.x, c.y])
            .collect();

        let value = match positions.len() {
            0 => return None,
            1 => GeometryValue::new_point(positions[0]),
            _ => GeometryValue::new_line_string(positions),
        };
        Some(Geometry::new(value))
    }

    /// `GeoJSON` feature with the route length in its properties.
    /// Extra properties are merged in as given.
    pub fn to_feature(
        &self,
        graph: &StreetGraph,
        extra: Map<String, JsonValue>,
    ) -> Result<Feature, Error> {
        let mut properties = extra;
        properties.insert("length_m".to_string(), json!(self.length));
        properties.insert("node_count".to_string(), json!(self.nodes.len()));

        let value = json!({
            "type": "Feature",
            "geometry": self.geometry(graph),
            "properties": properties,
        });

        serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}
