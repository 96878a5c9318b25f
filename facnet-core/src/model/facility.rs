//! Facilities and the session-scoped table holding them

use std::collections::BTreeMap;

use geo::Point;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Named point of interest, WGS84 decimal degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Opaque pass-through columns
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl Facility {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            category: None,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Location as a `geo` point (x = longitude, y = latitude)
    pub fn geometry(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Immutable table of facilities, unique by name
///
/// A store lives as long as one uploaded data set; loading a new file
/// replaces the whole store rather than mutating it.
#[derive(Debug, Clone, Default)]
pub struct FacilityStore {
    facilities: Vec<Facility>,
    by_name: HashMap<String, usize>,
}

impl FacilityStore {
    /// Builds a store, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] on duplicate names or coordinates
    /// outside the WGS84 range.
    pub fn new(facilities: impl IntoIterator<Item = Facility>) -> Result<Self, Error> {
        let facilities: Vec<Facility> = facilities.into_iter().collect();
        let mut by_name = HashMap::with_capacity(facilities.len());

        for (idx, facility) in facilities.iter().enumerate() {
            validate_coordinates(facility)?;
            if by_name.insert(facility.name.clone(), idx).is_some() {
                return Err(Error::InvalidData(format!(
                    "Duplicate facility name: {}",
                    facility.name
                )));
            }
        }

        Ok(Self {
            facilities,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Facility> {
        self.facilities.iter()
    }

    pub fn as_slice(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.facilities.iter().map(|f| f.name.as_str())
    }

    /// Looks up a facility by its display name
    pub fn get(&self, name: &str) -> Result<&Facility, Error> {
        self.by_name
            .get(name)
            .map(|&idx| &self.facilities[idx])
            .ok_or_else(|| Error::FacilityNotFound(name.to_string()))
    }

    /// Resolves several names, keeping the order they were given in
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&Facility>, Error> {
        names.iter().map(|name| self.get(name.as_ref())).collect()
    }
}

fn validate_coordinates(facility: &Facility) -> Result<(), Error> {
    let lat_ok = facility.latitude.is_finite() && (-90.0..=90.0).contains(&facility.latitude);
    let lon_ok = facility.longitude.is_finite() && (-180.0..=180.0).contains(&facility.longitude);
    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "Facility '{}' has coordinates out of range: ({}, {})",
            facility.name, facility.latitude, facility.longitude
        )))
    }
}
