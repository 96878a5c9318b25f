//! Facility tables from CSV
//!
//! The header row decides the layout. A name column (`facility_name` or
//! `name`) and coordinate columns (`latitude`/`longitude`, or `lat`/`lon`)
//! are required; a category column is optional; every other column is kept
//! as an opaque attribute. Rows without usable coordinates are dropped.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};

use crate::{Error, Facility, FacilityStore};

const NAME_COLUMNS: &[&str] = &["facility_name", "name"];
const LATITUDE_COLUMNS: &[&str] = &["latitude", "lat"];
const LONGITUDE_COLUMNS: &[&str] = &["longitude", "lon", "lng"];
const CATEGORY_COLUMNS: &[&str] = &["category", "type", "amenity", "operator_type"];

struct Layout {
    name: usize,
    latitude: usize,
    longitude: usize,
    category: Option<usize>,
}

impl Layout {
    fn detect(headers: &StringRecord) -> Result<Self, Error> {
        let find = |candidates: &[&str]| {
            candidates.iter().find_map(|candidate| {
                headers
                    .iter()
                    .position(|header| header.eq_ignore_ascii_case(candidate))
            })
        };
        let require = |candidates: &[&str]| {
            find(candidates).ok_or_else(|| {
                Error::InvalidData(format!(
                    "Facility table needs one of the columns: {}",
                    candidates.join(", ")
                ))
            })
        };

        Ok(Self {
            name: require(NAME_COLUMNS)?,
            latitude: require(LATITUDE_COLUMNS)?,
            longitude: require(LONGITUDE_COLUMNS)?,
            category: find(CATEGORY_COLUMNS),
        })
    }

    fn is_reserved(&self, column: usize) -> bool {
        column == self.name
            || column == self.latitude
            || column == self.longitude
            || Some(column) == self.category
    }
}

/// Reads a facility table from CSV text
///
/// # Errors
///
/// [`Error::CsvError`] for malformed CSV, [`Error::InvalidData`] for a
/// missing required column or duplicate facility names.
pub fn read_facilities<R: Read>(reader: R) -> Result<FacilityStore, Error> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let layout = Layout::detect(&headers)?;

    let mut facilities = Vec::new();
    let mut dropped = 0_usize;

    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = row + 2;

        let name = record.get(layout.name).unwrap_or_default();
        if name.is_empty() {
            warn!("Row {line}: facility without a name skipped");
            dropped += 1;
            continue;
        }

        let coordinate = |column: usize| {
            record
                .get(column)
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| value.is_finite())
        };
        let (Some(latitude), Some(longitude)) =
            (coordinate(layout.latitude), coordinate(layout.longitude))
        else {
            warn!("Row {line}: facility '{name}' has no usable coordinates, skipped");
            dropped += 1;
            continue;
        };

        let category = layout
            .category
            .and_then(|column| record.get(column))
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let attributes: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(column, (_, value))| !layout.is_reserved(*column) && !value.is_empty())
            .map(|(_, (header, value))| (header.to_string(), value.to_string()))
            .collect();

        facilities.push(Facility {
            name: name.to_string(),
            latitude,
            longitude,
            category,
            attributes,
        });
    }

    info!(
        "Loaded {} facilities ({dropped} rows dropped)",
        facilities.len()
    );

    FacilityStore::new(facilities)
}

pub fn read_facilities_from_path(path: &Path) -> Result<FacilityStore, Error> {
    let file = std::fs::File::open(path)?;
    read_facilities(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_facility_upload_layout() {
        let data = "\
OBJECTID,facility_name,Type,Owner,County,latitude,longitude
1,Kenyatta National Hospital,Hospital,Ministry of Health,Nairobi,-1.3009,36.8070
2,Mbagathi Hospital,Hospital,Ministry of Health,Nairobi,-1.3085,36.8040
";
        let store = read_facilities(data.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);

        let knh = store.get("Kenyatta National Hospital").unwrap();
        assert_eq!(knh.latitude, -1.3009);
        assert_eq!(knh.longitude, 36.8070);
        assert_eq!(knh.category.as_deref(), Some("Hospital"));
        assert_eq!(knh.attributes["Owner"], "Ministry of Health");
        assert_eq!(knh.attributes["OBJECTID"], "1");
        assert!(!knh.attributes.contains_key("latitude"));
    }

    #[test]
    fn rows_without_coordinates_are_dropped() {
        let data = "\
name,amenity,operator_type,latitude,longitude
Clinic A,clinic,public,-1.28,36.82
Clinic B,clinic,private,,36.83
Clinic C,clinic,private,not-a-number,36.84
,clinic,public,-1.29,36.85
";
        let store = read_facilities(data.as_bytes()).unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), ["Clinic A"]);
        assert_eq!(store.get("Clinic A").unwrap().category.as_deref(), Some("clinic"));
    }

    #[test]
    fn missing_coordinate_column_is_invalid() {
        let data = "facility_name,x,y\nA,1,2\n";
        assert!(matches!(
            read_facilities(data.as_bytes()),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn duplicate_names_are_invalid() {
        let data = "name,lat,lon\nA,0.1,0.1\nA,0.2,0.2\n";
        assert!(matches!(
            read_facilities(data.as_bytes()),
            Err(Error::InvalidData(_))
        ));
    }
}
