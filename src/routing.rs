use facnet_core::prelude::*;
use geojson::{Feature, FeatureCollection};
use serde::Serialize;
use serde_json::{Map, json};

use crate::Session;

/// Route between two named facilities, ready for display
#[derive(Debug, Clone, Serialize)]
pub struct FacilityRoute {
    pub origin: String,
    pub destination: String,
    /// Metres
    pub length: Meters,
    /// Street geometry as a `GeoJSON` feature: a `LineString`, or a `Point`
    /// when both ends snap to one node
    pub feature: Feature,
}

impl FacilityRoute {
    pub(crate) fn render(
        graph: &StreetGraph,
        origin: &Facility,
        destination: &Facility,
        route: &Route,
    ) -> Result<Self, Error> {
        let mut properties = Map::new();
        properties.insert("origin".to_string(), json!(origin.name));
        properties.insert("destination".to_string(), json!(destination.name));

        Ok(Self {
            origin: origin.name.clone(),
            destination: destination.name.clone(),
            length: route.length(),
            feature: route.to_feature(graph, properties)?,
        })
    }
}

/// Collects route features for map display
pub fn feature_collection<'a>(routes: impl IntoIterator<Item = &'a FacilityRoute>) -> FeatureCollection {
    routes.into_iter().map(|r| r.feature.clone()).collect()
}

/// Point feature for a facility, with its category and attributes
pub fn facility_feature(facility: &Facility) -> Result<Feature, Error> {
    let value = json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [facility.longitude, facility.latitude],
        },
        "properties": {
            "name": facility.name,
            "category": facility.category,
            "attributes": facility.attributes,
        },
    });
    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

impl Session {
    /// Shortest drivable route between two facilities of the current table
    pub fn route(&self, place: &str, origin: &str, destination: &str) -> Result<FacilityRoute, Error> {
        let store = self.facilities();
        let origin = store.get(origin)?;
        let destination = store.get(destination)?;
        let graph = self.network(place)?;

        let route = shortest_path(
            &graph,
            resolve_facility(&graph, origin)?,
            resolve_facility(&graph, destination)?,
        )?;

        log::debug!(
            "Route '{}' -> '{}': {:.0} m over {} nodes",
            origin.name,
            destination.name,
            route.length(),
            route.nodes().len()
        );

        FacilityRoute::render(&graph, origin, destination, &route)
    }

    /// Facilities of the current table as a `GeoJSON` point layer
    pub fn facilities_geojson(&self) -> Result<FeatureCollection, Error> {
        let store = self.facilities();
        store.iter().map(facility_feature).collect()
    }
}
