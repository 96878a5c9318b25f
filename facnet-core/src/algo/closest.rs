//! Closest-facility ranking

use super::{BatchPolicy, routes_from};
use crate::{Error, Facility, Meters, StreetGraph, routing::Route};

/// Candidate reached from the source facility
#[derive(Debug, Clone)]
pub struct ClosestFacility<'a> {
    pub facility: &'a Facility,
    pub route: Route,
}

impl ClosestFacility<'_> {
    pub fn length(&self) -> Meters {
        self.route.length()
    }
}

/// Ranks `candidates` by route length from `source`, nearest first.
///
/// The source itself is never ranked, even when listed among the
/// candidates. Equal lengths keep candidate input order. Under
/// [`BatchPolicy::Exclude`] unreachable candidates are dropped, so the
/// result may be shorter than the input or empty.
///
/// # Errors
///
/// Resolution errors of the source or any candidate, and under
/// [`BatchPolicy::Strict`] the first [`Error::NoPathFound`].
pub fn closest<'a>(
    graph: &StreetGraph,
    source: &Facility,
    candidates: &[&'a Facility],
    policy: BatchPolicy,
) -> Result<Vec<ClosestFacility<'a>>, Error> {
    let mut ranked: Vec<ClosestFacility<'a>> =
        routes_from(graph, source, candidates, policy, |candidate| {
            candidate.name == source.name
        })?
        .into_iter()
        .map(|(facility, route)| ClosestFacility { facility, route })
        .collect();

    // stable: ties keep input order
    ranked.sort_by(|a, b| a.length().total_cmp(&b.length()));

    log::debug!(
        "Ranked {} of {} candidates around '{}'",
        ranked.len(),
        candidates.len(),
        source.name
    );

    Ok(ranked)
}
