use facnet_core::prelude::*;
use geojson::FeatureCollection;
use serde::Serialize;

use crate::{
    Session,
    routing::{FacilityRoute, facility_feature},
};

/// One entry of a closest-facility ranking
#[derive(Debug, Clone, Serialize)]
pub struct RankedFacility {
    /// 1-based position in the ranking
    pub rank: usize,
    pub facility: Facility,
    pub route: FacilityRoute,
}

/// Which facilities a closest-facility query considers
#[derive(Debug, Clone, Default)]
pub struct ClosestQuery {
    /// Candidate names; every other facility of the table when `None`
    pub candidates: Option<Vec<String>>,
    /// Keep only this many nearest candidates
    pub limit: Option<usize>,
    pub policy: BatchPolicy,
}

impl Session {
    /// Ranks candidates by route length from `source`, nearest first
    pub fn closest(
        &self,
        place: &str,
        source: &str,
        query: &ClosestQuery,
    ) -> Result<Vec<RankedFacility>, Error> {
        let store = self.facilities();
        let source = store.get(source)?;
        let candidates = match &query.candidates {
            Some(names) => store.select(names.as_slice())?,
            None => store.iter().collect(),
        };
        let graph = self.network(place)?;

        let ranked = closest(&graph, source, &candidates, query.policy)?;
        let limit = query.limit.unwrap_or(ranked.len());

        ranked
            .iter()
            .take(limit)
            .enumerate()
            .map(|(idx, entry)| {
                Ok(RankedFacility {
                    rank: idx + 1,
                    facility: entry.facility.clone(),
                    route: FacilityRoute::render(&graph, source, entry.facility, &entry.route)?,
                })
            })
            .collect()
    }
}

/// Map layer for a ranking: the source and candidate points plus one line
/// per route
pub fn ranking_geojson(source: &Facility, ranking: &[RankedFacility]) -> Result<FeatureCollection, Error> {
    let mut features = vec![facility_feature(source)?];
    for entry in ranking {
        features.push(facility_feature(&entry.facility)?);
        features.push(entry.route.feature.clone());
    }
    Ok(features.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::cbd_session;

    #[test]
    fn ranks_every_other_facility_by_default() {
        let session = cbd_session();
        let ranking = session
            .closest("Nairobi", "Hospital", &ClosestQuery::default())
            .unwrap();

        let names: Vec<_> = ranking.iter().map(|r| r.facility.name.as_str()).collect();
        // Outpost is unreachable and left out
        assert_eq!(names, ["Clinic North", "Pharmacy", "Clinic South"]);
        assert_eq!(ranking.iter().map(|r| r.rank).collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(ranking[0].route.length, 200.0);
        assert_eq!(ranking[1].route.length, 200.0);
    }

    #[test]
    fn limit_and_candidate_list() {
        let session = cbd_session();
        let query = ClosestQuery {
            candidates: Some(vec!["Clinic South".into(), "Pharmacy".into()]),
            limit: Some(1),
            policy: BatchPolicy::Exclude,
        };

        let ranking = session.closest("Nairobi", "Clinic North", &query).unwrap();
        // both are 200 m away; the tie keeps candidate order
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].facility.name, "Clinic South");
        assert_eq!(ranking[0].route.origin, "Clinic North");
    }

    #[test]
    fn strict_ranking_fails_on_unreachable() {
        let session = cbd_session();
        let query = ClosestQuery {
            policy: BatchPolicy::Strict,
            ..ClosestQuery::default()
        };
        assert!(matches!(
            session.closest("Nairobi", "Hospital", &query),
            Err(Error::NoPathFound { .. })
        ));
    }

    #[test]
    fn ranking_layer_contains_points_and_routes() {
        let session = cbd_session();
        let store = session.facilities();
        let ranking = session
            .closest("Nairobi", "Hospital", &ClosestQuery::default())
            .unwrap();

        let layer = ranking_geojson(store.get("Hospital").unwrap(), &ranking).unwrap();
        assert_eq!(layer.features.len(), 1 + 2 * ranking.len());
    }
}
