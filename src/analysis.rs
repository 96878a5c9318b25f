//! Named-facility entry points for the analyses without a solver.
//!
//! Inputs are resolved against the current table and network first, so an
//! unknown name or an unreachable data source is reported as such.

use std::convert::Infallible;

use facnet_core::prelude::*;

use crate::Session;

impl Session {
    pub fn service_area(&self, place: &str, facility: &str, cutoff: Meters) -> Result<Infallible, Error> {
        let store = self.facilities();
        let facility = store.get(facility)?;
        let graph = self.network(place)?;
        service_area(&graph, facility, cutoff)
    }

    pub fn solve_vrp<S: AsRef<str>>(
        &self,
        place: &str,
        depot: &str,
        stops: &[S],
        vehicles: usize,
    ) -> Result<Infallible, Error> {
        let store = self.facilities();
        let depot = store.get(depot)?;
        let stops = store.select(stops)?;
        let graph = self.network(place)?;
        solve_vrp(&graph, depot, &stops, vehicles)
    }

    pub fn location_allocation<C: AsRef<str>, D: AsRef<str>>(
        &self,
        place: &str,
        candidates: &[C],
        demand: &[D],
        facilities_to_site: usize,
    ) -> Result<Infallible, Error> {
        let store = self.facilities();
        let candidates = store.select(candidates)?;
        let demand = store.select(demand)?;
        let graph = self.network(place)?;
        location_allocation(&graph, &candidates, &demand, facilities_to_site)
    }
}
