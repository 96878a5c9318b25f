//! Online network source backed by Nominatim and the Overpass API
//!
//! A place name is geocoded to an OSM boundary, the boundary is turned into
//! an Overpass area and every drivable way inside it is downloaded. The
//! whole exchange is blocking; callers on an async runtime must move it to
//! a blocking thread.

use std::collections::HashMap as StdHashMap;
use std::time::Duration;

use hashbrown::HashMap;
use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;

use super::config::OverpassConfig;
use super::osm::{DRIVABLE_FILTER, OsmWay, assemble_graph, drivable_travel};
use crate::{Error, StreetGraph, loading::NetworkSource};

/// Overpass area ids are derived from the boundary's own OSM id
const RELATION_AREA_OFFSET: i64 = 3_600_000_000;
const WAY_AREA_OFFSET: i64 = 2_400_000_000;

#[derive(Debug, Clone)]
pub struct OverpassSource {
    config: OverpassConfig,
}

impl OverpassSource {
    pub fn new(config: OverpassConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverpassConfig {
        &self.config
    }

    fn client(&self, place: &str) -> Result<Client, Error> {
        Client::builder()
            .user_agent(self.config.user_agent.clone())
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| Error::network_fetch(place, e))
    }

    /// Resolves `place` to an Overpass area id
    fn geocode(&self, client: &Client, place: &str) -> Result<i64, Error> {
        let url = format!("{}/search", self.config.nominatim_url.trim_end_matches('/'));
        let candidates: Vec<NominatimPlace> = client
            .get(url)
            .query(&[("q", place), ("format", "jsonv2"), ("limit", "5")])
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::json)
            .map_err(|e| Error::network_fetch(place, e))?;

        let found = candidates
            .iter()
            .find_map(NominatimPlace::area_id)
            .ok_or_else(|| Error::network_fetch(place, "place did not resolve to an OSM boundary"))?;

        debug!("Place '{place}' resolved to Overpass area {found}");
        Ok(found)
    }

    fn download(&self, client: &Client, place: &str, area_id: i64) -> Result<OverpassResponse, Error> {
        let query = overpass_query(area_id, self.config.timeout_secs);
        debug!("Overpass query:\n{query}");

        client
            .post(&self.config.overpass_url)
            .header("Content-Type", "text/plain")
            .body(query)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::json)
            .map_err(|e| Error::network_fetch(place, e))
    }
}

impl NetworkSource for OverpassSource {
    fn fetch(&self, place: &str) -> Result<StreetGraph, Error> {
        let client = self.client(place)?;
        let area_id = self.geocode(&client, place)?;

        info!("Downloading drivable roads for '{place}' from Overpass API");
        let response = self.download(&client, place, area_id)?;
        info!("Downloaded {} OSM elements", response.elements.len());

        let graph = graph_from_elements(&response.elements)?;
        if graph.is_empty() {
            return Err(Error::network_fetch(place, "area contains no drivable roads"));
        }
        Ok(graph)
    }
}

fn overpass_query(area_id: i64, timeout_secs: u64) -> String {
    format!(
        r#"[out:json][timeout:{timeout_secs}];
area({area_id})->.searchArea;
(
  way["highway"~"{DRIVABLE_FILTER}"](area.searchArea);
);
(._;>;);
out body;"#
    )
}

/// Builds the street graph out of a decoded Overpass `out body` answer
fn graph_from_elements(elements: &[OsmElement]) -> Result<StreetGraph, Error> {
    let mut positions: HashMap<i64, (f64, f64)> = HashMap::new();
    let mut ways = Vec::new();

    for element in elements {
        match element.elem_type.as_str() {
            "node" => {
                if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                    positions.insert(element.id, (lat, lon));
                }
            }
            "way" => {
                let tags = element
                    .tags
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()));
                if let Some(travel) = drivable_travel(tags) {
                    ways.push(OsmWay {
                        id: element.id,
                        refs: element.nodes.clone(),
                        travel,
                    });
                }
            }
            _ => {}
        }
    }

    assemble_graph(&positions, &ways)
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    osm_type: String,
    osm_id: i64,
}

impl NominatimPlace {
    fn area_id(&self) -> Option<i64> {
        match self.osm_type.as_str() {
            "relation" => Some(RELATION_AREA_OFFSET + self.osm_id),
            "way" => Some(WAY_AREA_OFFSET + self.osm_id),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<OsmElement>,
}

#[derive(Debug, Deserialize)]
struct OsmElement {
    #[serde(rename = "type")]
    elem_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    nodes: Vec<i64>,
    #[serde(default)]
    tags: StdHashMap<String, String>,
}
