use std::io::Read;
use std::sync::Arc;

use facnet_core::prelude::*;
use parking_lot::RwLock;

/// One analyst's working state: the uploaded facility table and the road
/// networks loaded so far.
///
/// The facility table is replaced wholesale on upload; operations already
/// running keep the snapshot they started with. Networks are shared through
/// the [`NetworkProvider`], which may be shared between sessions.
pub struct Session {
    provider: Arc<NetworkProvider>,
    facilities: RwLock<Arc<FacilityStore>>,
}

impl Session {
    /// Session with an empty facility table
    pub fn new(provider: Arc<NetworkProvider>) -> Self {
        Self {
            provider,
            facilities: RwLock::new(Arc::new(FacilityStore::default())),
        }
    }

    pub fn from_config(config: NetworkSourceConfig) -> Self {
        Self::new(Arc::new(NetworkProvider::from_boxed(config.into_source())))
    }

    #[must_use]
    pub fn with_facilities(self, store: FacilityStore) -> Self {
        self.replace_facilities(store);
        self
    }

    pub fn provider(&self) -> &Arc<NetworkProvider> {
        &self.provider
    }

    /// Snapshot of the current facility table
    pub fn facilities(&self) -> Arc<FacilityStore> {
        Arc::clone(&*self.facilities.read())
    }

    /// Swaps in a new facility table, returning the one it replaced
    pub fn replace_facilities(&self, store: FacilityStore) -> Arc<FacilityStore> {
        log::info!("Facility table replaced ({} facilities)", store.len());
        std::mem::replace(&mut *self.facilities.write(), Arc::new(store))
    }

    /// Parses a CSV upload and makes it the current facility table.
    ///
    /// A malformed upload leaves the previous table in place.
    pub fn load_facilities<R: Read>(&self, reader: R) -> Result<Arc<FacilityStore>, Error> {
        let store = read_facilities(reader)?;
        self.replace_facilities(store);
        Ok(self.facilities())
    }

    /// Road network for `place`, fetched on first use
    pub fn network(&self, place: &str) -> Result<Arc<StreetGraph>, Error> {
        self.provider.get_network(place)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("facilities", &self.facilities.read().len())
            .field("provider", &self.provider)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Street grid around the Nairobi CBD, 3x3 intersections, two-way
    pub(crate) fn cbd_graph(_place: &str) -> Result<StreetGraph, Error> {
        let mut builder = StreetGraphBuilder::new();
        let mut nodes = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                nodes.push(builder.add_node(
                    -1.2800 - f64::from(row) * 0.001,
                    36.8200 + f64::from(col) * 0.001,
                ));
            }
        }
        for row in 0..3 {
            for col in 0..3 {
                let here = nodes[row * 3 + col];
                if col < 2 {
                    builder.add_road(here, nodes[row * 3 + col + 1], 100.0)?;
                }
                if row < 2 {
                    builder.add_road(here, nodes[(row + 1) * 3 + col], 100.0)?;
                }
            }
        }
        // unreachable roundabout north of the grid
        builder.add_node(-1.2700, 36.8200);
        Ok(builder.build())
    }

    pub(crate) const CBD_CSV: &str = "\
facility_name,Type,latitude,longitude
Hospital,Hospital,-1.2800,36.8200
Clinic North,Clinic,-1.2800,36.8220
Clinic South,Clinic,-1.2820,36.8220
Pharmacy,Pharmacy,-1.2810,36.8210
Outpost,Clinic,-1.2700,36.8200
";

    pub(crate) fn cbd_session() -> Session {
        let session = Session::new(Arc::new(NetworkProvider::new(cbd_graph)));
        session.load_facilities(CBD_CSV.as_bytes()).unwrap();
        session
    }

    #[test]
    fn upload_replaces_facility_table() {
        let session = cbd_session();
        let before = session.facilities();
        assert_eq!(before.len(), 5);

        session
            .load_facilities("name,lat,lon\nDepot,-1.28,36.82\n".as_bytes())
            .unwrap();
        assert_eq!(session.facilities().names().collect::<Vec<_>>(), ["Depot"]);
        // old snapshot stays usable
        assert!(before.get("Hospital").is_ok());
    }

    #[test]
    fn bad_upload_keeps_previous_table() {
        let session = cbd_session();
        assert!(session.load_facilities("x,y\n1,2\n".as_bytes()).is_err());
        assert_eq!(session.facilities().len(), 5);
    }
}
