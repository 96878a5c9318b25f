//! Session-level facility network analysis.
//!
//! A [`Session`] pairs the current facility table with a shared
//! [`NetworkProvider`](facnet_core::NetworkProvider) and exposes every
//! analysis by facility name and place name.

pub mod analysis;
pub mod closest;
pub mod matrix;
pub mod routing;
pub mod session;

pub use closest::{ClosestQuery, RankedFacility, ranking_geojson};
pub use facnet_core::{Error, prelude};
pub use routing::{FacilityRoute, facility_feature, feature_collection};
pub use session::Session;
