use facnet_core::prelude::*;

use crate::{Session, routing::FacilityRoute};

impl Session {
    /// Route lengths from one facility to each destination, in destination
    /// order
    pub fn od_matrix<S: AsRef<str>>(
        &self,
        place: &str,
        origin: &str,
        destinations: &[S],
        policy: BatchPolicy,
    ) -> Result<Vec<CostMatrixEntry>, Error> {
        self.od_cost_matrix(place, &[origin], destinations, policy)
    }

    /// Origin-major cost matrix between named facilities
    pub fn od_cost_matrix<O: AsRef<str>, D: AsRef<str>>(
        &self,
        place: &str,
        origins: &[O],
        destinations: &[D],
        policy: BatchPolicy,
    ) -> Result<Vec<CostMatrixEntry>, Error> {
        let store = self.facilities();
        let origins = store.select(origins)?;
        let destinations = store.select(destinations)?;
        let graph = self.network(place)?;

        let matrix = od_cost_matrix(&graph, &origins, &destinations, policy)?;
        log::info!(
            "OD matrix on '{place}': {} of {} pairs reachable",
            matrix.len(),
            origins.len() * destinations.len()
        );
        Ok(matrix)
    }

    /// Rendered routes from one facility to each reachable destination
    pub fn od_routes<S: AsRef<str>>(
        &self,
        place: &str,
        origin: &str,
        destinations: &[S],
        policy: BatchPolicy,
    ) -> Result<Vec<FacilityRoute>, Error> {
        let store = self.facilities();
        let origin = store.get(origin)?;
        let destinations = store.select(destinations)?;
        let graph = self.network(place)?;

        od_routes(&graph, origin, &destinations, policy)?
            .iter()
            .map(|od| FacilityRoute::render(&graph, od.origin, od.destination, &od.route))
            .collect()
    }
}
