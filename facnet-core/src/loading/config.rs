use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{NetworkSource, OsmPbfSource, OverpassSource};

/// Where road networks come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkSourceConfig {
    /// Local OSM PBF extracts keyed by place name
    Pbf {
        places: BTreeMap<String, PathBuf>,
        #[serde(default)]
        base_dir: Option<PathBuf>,
    },
    /// Nominatim geocoding + Overpass download
    Overpass(OverpassConfig),
}

impl Default for NetworkSourceConfig {
    fn default() -> Self {
        Self::Overpass(OverpassConfig::default())
    }
}

impl NetworkSourceConfig {
    pub fn into_source(self) -> Box<dyn NetworkSource> {
        match self {
            Self::Pbf { places, base_dir } => Box::new(OsmPbfSource::new(places, base_dir)),
            Self::Overpass(config) => Box::new(OverpassSource::new(config)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverpassConfig {
    pub nominatim_url: String,
    pub overpass_url: String,
    /// Both services reject anonymous clients
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            user_agent: concat!("facnet/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 180,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pbf_config_from_json() {
        let config: NetworkSourceConfig = serde_json::from_str(
            r#"{"kind": "pbf", "base_dir": "/srv/osm",
                "places": {"Nairobi, Kenya": "nairobi.osm.pbf"}}"#,
        )
        .unwrap();

        match config {
            NetworkSourceConfig::Pbf { places, base_dir } => {
                assert_eq!(base_dir, Some(PathBuf::from("/srv/osm")));
                assert_eq!(places["Nairobi, Kenya"], PathBuf::from("nairobi.osm.pbf"));
            }
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[test]
    fn overpass_defaults_fill_missing_fields() {
        let config: NetworkSourceConfig =
            serde_json::from_str(r#"{"kind": "overpass", "timeout_secs": 60}"#).unwrap();

        let NetworkSourceConfig::Overpass(overpass) = config else {
            panic!("expected overpass config");
        };
        assert_eq!(overpass.timeout_secs, 60);
        assert_eq!(overpass.overpass_url, OverpassConfig::default().overpass_url);
    }
}
