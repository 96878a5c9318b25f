//! Place-keyed road network cache
//!
//! Graphs are fetched at most once per place name and never evicted for the
//! lifetime of the provider. Each place owns a slot lock, so concurrent first
//! requests for one place wait for a single fetch while other places load
//! independently. A failed fetch leaves the slot empty; nothing is retried
//! until the caller asks again.

use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::{Error, model::StreetGraph};

/// Source of drivable street graphs keyed by place name
pub trait NetworkSource: Send + Sync {
    /// Builds the graph for `place`. May block for a long time.
    ///
    /// # Errors
    ///
    /// [`Error::NetworkFetch`] if the place cannot be resolved or the data
    /// source is unreachable.
    fn fetch(&self, place: &str) -> Result<StreetGraph, Error>;
}

impl<F> NetworkSource for F
where
    F: Fn(&str) -> Result<StreetGraph, Error> + Send + Sync,
{
    fn fetch(&self, place: &str) -> Result<StreetGraph, Error> {
        self(place)
    }
}

type GraphSlot = Arc<Mutex<Option<Arc<StreetGraph>>>>;

/// Memoizing front of a [`NetworkSource`]
pub struct NetworkProvider {
    source: Box<dyn NetworkSource>,
    cache: Mutex<HashMap<String, GraphSlot>>,
}

impl NetworkProvider {
    pub fn new(source: impl NetworkSource + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn NetworkSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the graph for `place`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the source's [`Error::NetworkFetch`]; empty place names
    /// are rejected the same way.
    pub fn get_network(&self, place: &str) -> Result<Arc<StreetGraph>, Error> {
        if place.trim().is_empty() {
            return Err(Error::network_fetch(place, "place name is empty"));
        }

        let slot = {
            let mut cache = self.cache.lock();
            Arc::clone(cache.entry(place.to_string()).or_default())
        };

        let mut graph = slot.lock();
        if let Some(cached) = graph.as_ref() {
            debug!("Using cached road network for '{place}'");
            return Ok(Arc::clone(cached));
        }

        info!("Fetching road network for '{place}'");
        let started = Instant::now();
        let fetched = match self.source.fetch(place) {
            Ok(fetched) => Arc::new(fetched),
            Err(e) => {
                warn!("Road network fetch for '{place}' failed: {e}");
                return Err(e);
            }
        };

        info!(
            "Road network for '{place}' ready: {} nodes, {} edges in {:.1?}",
            fetched.node_count(),
            fetched.edge_count(),
            started.elapsed()
        );

        *graph = Some(Arc::clone(&fetched));
        Ok(fetched)
    }

    /// Whether a graph for `place` has already been built
    pub fn is_cached(&self, place: &str) -> bool {
        let slot = self.cache.lock().get(place).cloned();
        slot.as_deref().is_some_and(|slot| slot.lock().is_some())
    }

    /// Places with a loaded graph, sorted by name
    pub fn cached_places(&self) -> Vec<String> {
        let slots: Vec<(String, GraphSlot)> = self
            .cache
            .lock()
            .iter()
            .map(|(place, slot)| (place.clone(), Arc::clone(slot)))
            .collect();

        let mut places: Vec<String> = slots
            .into_iter()
            .filter(|(_, slot)| slot.lock().is_some())
            .map(|(place, _)| place)
            .collect();
        places.sort_unstable();
        places
    }
}

impl std::fmt::Debug for NetworkProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkProvider")
            .field("cached_places", &self.cached_places())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::StreetGraphBuilder;

    fn tiny_graph() -> StreetGraph {
        let mut builder = StreetGraphBuilder::new();
        let a = builder.add_node(-1.29, 36.82);
        let b = builder.add_node(-1.30, 36.82);
        builder.add_road(a, b, 1_100.0).unwrap();
        builder.build()
    }

    fn fixed_source(_place: &str) -> Result<StreetGraph, Error> {
        Ok(tiny_graph())
    }

    #[test]
    fn closures_are_sources() {
        let provider = NetworkProvider::new(fixed_source);
        assert_eq!(provider.get_network("Nairobi, Kenya").unwrap().node_count(), 2);
    }

    #[test]
    fn failed_fetch_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let provider = NetworkProvider::new(move |place: &str| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::network_fetch(place, "connection refused"))
            } else {
                Ok(tiny_graph())
            }
        });

        assert!(matches!(
            provider.get_network("Mombasa"),
            Err(Error::NetworkFetch { .. })
        ));
        assert!(!provider.is_cached("Mombasa"));
        assert!(provider.cached_places().is_empty());

        assert!(provider.get_network("Mombasa").is_ok());
        assert!(provider.is_cached("Mombasa"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_place_name_rejected() {
        let provider = NetworkProvider::new(fixed_source);
        assert!(matches!(
            provider.get_network("  "),
            Err(Error::NetworkFetch { .. })
        ));
    }

    #[test]
    fn cached_places_sorted() {
        let provider = NetworkProvider::new(fixed_source);
        provider.get_network("Nakuru").unwrap();
        provider.get_network("Kisumu").unwrap();
        assert_eq!(provider.cached_places(), ["Kisumu", "Nakuru"]);
    }
}
