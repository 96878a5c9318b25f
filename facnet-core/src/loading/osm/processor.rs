//! OSM pbf processing

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use log::info;
use osmpbf::{Element, ElementReader};

use super::{OsmWay, assemble_graph, drivable_travel};
use crate::{Error, StreetGraph, loading::NetworkSource};

/// Reads the drivable street graph out of an OSM PBF extract
///
/// # Errors
///
/// [`Error::InvalidData`] if the file cannot be read as PBF.
pub fn read_pbf(path: &Path) -> Result<StreetGraph, Error> {
    info!("Processing street data (OSM): {}", path.display());

    let reader = ElementReader::from_path(path).map_err(pbf_error)?;

    let mut positions: HashMap<i64, (f64, f64)> = HashMap::new();
    let mut ways: Vec<OsmWay> = Vec::new();

    reader
        .for_each(|element| match element {
            Element::Node(node) => {
                positions.insert(node.id(), (node.lat(), node.lon()));
            }
            Element::DenseNode(node) => {
                positions.insert(node.id(), (node.lat(), node.lon()));
            }
            Element::Way(way) => {
                if let Some(travel) = drivable_travel(way.tags()) {
                    ways.push(OsmWay {
                        id: way.id(),
                        refs: way.refs().collect(),
                        travel,
                    });
                }
            }
            _ => {}
        })
        .map_err(pbf_error)?;

    info!(
        "Read {} nodes and {} drivable ways from {}",
        positions.len(),
        ways.len(),
        path.display()
    );

    let graph = assemble_graph(&positions, &ways)?;
    drop(positions);
    drop(ways);

    // Decoding a large extract leaves a lot of freed heap behind; hand it
    // back to the OS now that only the graph remains.
    //
    // SAFETY: glibc's malloc_trim has no preconditions; the cfg limits it
    // to linux-gnu targets.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    unsafe {
        if libc::malloc_trim(0) == 0 {
            log::debug!("No heap memory released after reading {}", path.display());
        }
    }

    Ok(graph)
}

fn pbf_error(e: osmpbf::Error) -> Error {
    Error::InvalidData(format!("Invalid OSM PBF data: {e}"))
}

/// Offline network source: one PBF extract per place name
#[derive(Debug, Clone, Default)]
pub struct OsmPbfSource {
    places: BTreeMap<String, PathBuf>,
    base_dir: Option<PathBuf>,
}

impl OsmPbfSource {
    pub fn new(places: BTreeMap<String, PathBuf>, base_dir: Option<PathBuf>) -> Self {
        Self { places, base_dir }
    }

    #[must_use]
    pub fn with_place(mut self, place: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.places.insert(place.into(), path.into());
        self
    }

    /// Extract configured for `place`, resolved against the base directory
    pub fn path_for(&self, place: &str) -> Option<PathBuf> {
        let path = self.places.get(place)?;
        Some(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.clone(),
        })
    }
}

impl NetworkSource for OsmPbfSource {
    fn fetch(&self, place: &str) -> Result<StreetGraph, Error> {
        let path = self
            .path_for(place)
            .ok_or_else(|| Error::network_fetch(place, "no OSM extract configured for place"))?;

        if !path.exists() {
            return Err(Error::network_fetch(
                place,
                format!("OSM file not found: {}", path.display()),
            ));
        }

        let graph = read_pbf(&path).map_err(|e| Error::network_fetch(place, e))?;
        if graph.is_empty() {
            return Err(Error::network_fetch(place, "extract contains no drivable roads"));
        }
        Ok(graph)
    }
}
