//! Joining top species with a user's observed taxa
//!
//! Pure functions: the view is recomputed from its inputs whenever it is
//! needed.

use crate::models::{ObservedTaxonSet, SpeciesObservationCount, SpeciesViewRecord};
use std::cmp::Ordering;

/// Ordering applied to the species view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    /// Most observed first
    #[default]
    #[value(name = "count", alias = "observation-count")]
    ObservationCount,
    /// Species not yet seen first
    #[value(name = "seen", alias = "seen-status")]
    SeenStatus,
    /// Grouped by position in the tree of life
    #[value(name = "taxonomy")]
    Taxonomy,
}

/// Annotate each species with whether the user has observed it
///
/// Without an observed set every record is unseen. Input order is kept.
pub fn combine(
    top: &[SpeciesObservationCount],
    observed: Option<&ObservedTaxonSet>,
) -> Vec<SpeciesViewRecord> {
    top.iter()
        .map(|species| {
            let seen = observed.is_some_and(|set| set.contains(species.taxon_id));
            SpeciesViewRecord::new(species.clone(), seen)
        })
        .collect()
}

/// Stable sort of view records by `key`
pub fn sort_records(mut records: Vec<SpeciesViewRecord>, key: SortKey) -> Vec<SpeciesViewRecord> {
    match key {
        SortKey::ObservationCount => records.sort_by(|a, b| {
            b.species
                .observation_count
                .cmp(&a.species.observation_count)
        }),
        SortKey::SeenStatus => records.sort_by_key(|r| r.seen),
        SortKey::Taxonomy => records.sort_by(|a, b| compare_ancestry(ancestry(a), ancestry(b))),
    }
    records
}

fn ancestry(record: &SpeciesViewRecord) -> Option<&[u64]> {
    record
        .species
        .ancestor_ids
        .as_deref()
        .filter(|ids| !ids.is_empty())
}

/// Element-wise comparison; a prefix sorts before its extensions and missing
/// ancestry sorts last
fn compare_ancestry(a: Option<&[u64]>, b: Option<&[u64]>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
