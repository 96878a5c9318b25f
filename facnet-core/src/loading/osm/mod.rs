//! OSM road data processing
//!
//! Shared by the offline PBF reader and the Overpass client: both collect
//! node positions and drivable ways, then hand them to [`assemble_graph`].

mod processor;

use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

pub use processor::{OsmPbfSource, read_pbf};

use crate::{Error, StreetGraph, StreetGraphBuilder, model::streets::network::segment_length};

/// Highway classes a car may use
const DRIVABLE_HIGHWAYS: &[&str] = &[
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "tertiary_link",
    "unclassified",
    "residential",
    "living_street",
    "road",
];

/// Overpass regex selecting the same highway classes as [`DRIVABLE_HIGHWAYS`]
pub(crate) const DRIVABLE_FILTER: &str = "^(motorway|motorway_link|trunk|trunk_link|primary|primary_link|\
secondary|secondary_link|tertiary|tertiary_link|unclassified|residential|living_street|road)$";

/// Directions a drivable way may be travelled in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    Both,
    Forward,
    Backward,
}

/// Drivable way with its node references in way order
#[derive(Debug, Clone)]
pub struct OsmWay {
    pub id: i64,
    pub refs: Vec<i64>,
    pub travel: Travel,
}

/// Decides from a way's tags whether cars may use it, and in which direction
pub fn drivable_travel<'a>(tags: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<Travel> {
    let mut highway = None;
    let mut oneway = None;
    let mut roundabout = false;

    for (key, value) in tags {
        match key {
            "highway" => highway = Some(value),
            "oneway" => oneway = Some(value),
            "junction" => roundabout = matches!(value, "roundabout" | "circular"),
            "area" if value == "yes" => return None,
            "access" | "motor_vehicle" | "motorcar" if matches!(value, "no" | "private") => {
                return None;
            }
            _ => {}
        }
    }

    let highway = highway.filter(|h| DRIVABLE_HIGHWAYS.contains(h))?;

    let travel = match oneway {
        Some("yes" | "true" | "1") => Travel::Forward,
        Some("-1" | "reverse") => Travel::Backward,
        Some("no" | "false" | "0") => Travel::Both,
        _ if roundabout || highway == "motorway" => Travel::Forward,
        _ => Travel::Both,
    };

    Some(travel)
}

/// Builds a street graph from node positions `(lat, lon)` and drivable ways.
///
/// Only nodes referenced by a way become graph nodes, in first-reference
/// order. Way references to unknown nodes are skipped.
pub fn assemble_graph(
    positions: &HashMap<i64, (f64, f64)>,
    ways: &[OsmWay],
) -> Result<StreetGraph, Error> {
    let mut builder = StreetGraphBuilder::with_capacity(positions.len().min(1 << 20), ways.len() * 4);
    let mut node_ids: HashMap<i64, NodeIndex> = HashMap::new();
    let mut missing_refs = 0_usize;

    for way in ways {
        let mut previous: Option<NodeIndex> = None;

        for osm_id in &way.refs {
            let Some(&(lat, lon)) = positions.get(osm_id) else {
                missing_refs += 1;
                previous = None;
                continue;
            };
            let current = *node_ids
                .entry(*osm_id)
                .or_insert_with(|| builder.add_osm_node(*osm_id, lat, lon));

            if let Some(from) = previous.filter(|&from| from != current) {
                let length = match (builder.node_position(from), builder.node_position(current)) {
                    (Some(a), Some(b)) => segment_length(a, b),
                    _ => return Err(Error::InvalidNodeIndex),
                };

                match way.travel {
                    Travel::Both => {
                        builder.add_way_edge(from, current, length, way.id)?;
                        builder.add_way_edge(current, from, length, way.id)?;
                    }
                    Travel::Forward => {
                        builder.add_way_edge(from, current, length, way.id)?;
                    }
                    Travel::Backward => {
                        builder.add_way_edge(current, from, length, way.id)?;
                    }
                }
            }
            previous = Some(current);
        }
    }

    if missing_refs > 0 {
        log::warn!("{missing_refs} way node references had no position and were skipped");
    }

    Ok(builder.build())
}
