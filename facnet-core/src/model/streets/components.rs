//! Street network components - nodes and directed road segments

use geo::Point;

use crate::Meters;

/// Street graph node (intersection or way vertex)
#[derive(Debug, Clone)]
pub struct StreetNode {
    /// OSM ID of the node, absent for synthetic graphs
    pub osm_id: Option<i64>,
    /// Node coordinates (x = longitude, y = latitude)
    pub geometry: Point<f64>,
}

impl StreetNode {
    pub fn latitude(&self) -> f64 {
        self.geometry.y()
    }

    pub fn longitude(&self) -> f64 {
        self.geometry.x()
    }
}

/// Directed street segment
#[derive(Debug, Clone)]
pub struct StreetEdge {
    /// Segment length in metres, never negative
    pub length: Meters,
    /// OSM way the segment was cut from
    pub way_id: Option<i64>,
}

impl StreetEdge {
    pub fn length(&self) -> Meters {
        self.length
    }
}
