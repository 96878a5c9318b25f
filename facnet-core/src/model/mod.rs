//! Data model for facility network analysis
//!
//! Contains facilities supplied by the user and the street graph they are
//! resolved onto.

pub mod facility;
pub mod streets;

pub use facility::{Facility, FacilityStore};
pub use streets::{StreetEdge, StreetGraph, StreetGraphBuilder, StreetNode};
