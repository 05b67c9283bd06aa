//! Data models for the life list engine

pub mod place;
pub mod species;
pub mod user;

pub use place::{Coordinates, Place};
pub use species::{
    ObservationRecord, ObservedTaxonSet, SpeciesObservationCount, SpeciesQuery, SpeciesViewRecord,
    TaxonSummary,
};
pub use user::UserProfile;
