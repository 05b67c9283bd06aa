//! Species counts, observation history and view records

use serde::Serialize;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// Base of the public taxon page link
pub const TAXON_PAGE_BASE_URL: &str = "https://www.inaturalist.org/taxa";

/// Parameters of a top-species request; also its cache key
///
/// Coordinates are compared by bit pattern so the query can key a map.
#[derive(Debug, Clone, Copy)]
pub struct SpeciesQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: u32,
    pub limit: u32,
}

impl SpeciesQuery {
    /// Build a query only when every parameter is present
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_km: Option<u32>,
        limit: Option<u32>,
    ) -> Option<Self> {
        let query = Self {
            latitude: latitude?,
            longitude: longitude?,
            radius_km: radius_km?,
            limit: limit?,
        };
        (query.limit > 0).then_some(query)
    }

    fn key(&self) -> (u64, u64, u32, u32) {
        (self.latitude.to_bits(), self.longitude.to_bits(), self.radius_km, self.limit)
    }
}

impl PartialEq for SpeciesQuery {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SpeciesQuery {}

impl Hash for SpeciesQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// One entry of the ranked species list for a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesObservationCount {
    pub taxon_id: u64,
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub iconic_taxon_id: Option<u64>,
    pub iconic_taxon_name: Option<String>,
    /// Root-to-taxon parent chain
    pub ancestor_ids: Option<Vec<u64>>,
    pub observation_count: u64,
    pub photo_url: Option<String>,
    pub wikipedia_url: Option<String>,
}

impl SpeciesObservationCount {
    /// Common name when known, scientific name otherwise
    pub fn display_name(&self) -> &str {
        self.common_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.scientific_name)
    }
}

/// A species entry annotated for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesViewRecord {
    #[serde(flatten)]
    pub species: SpeciesObservationCount,
    pub seen: bool,
    pub external_link: String,
}

impl SpeciesViewRecord {
    pub fn new(species: SpeciesObservationCount, seen: bool) -> Self {
        let external_link = format!("{}/{}", TAXON_PAGE_BASE_URL, species.taxon_id);
        Self {
            species,
            seen,
            external_link,
        }
    }
}

/// A single record of a user's observation history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationRecord {
    /// Absent for observations not yet identified
    pub taxon_id: Option<u64>,
}

/// Distinct taxa a user has observed
///
/// Only ever built from a complete history pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedTaxonSet {
    taxa: HashSet<u64>,
}

impl ObservedTaxonSet {
    pub fn contains(&self, taxon_id: u64) -> bool {
        self.taxa.contains(&taxon_id)
    }

    pub fn len(&self) -> usize {
        self.taxa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }
}

impl From<HashSet<u64>> for ObservedTaxonSet {
    fn from(taxa: HashSet<u64>) -> Self {
        Self { taxa }
    }
}

impl FromIterator<u64> for ObservedTaxonSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            taxa: iter.into_iter().collect(),
        }
    }
}

/// Minimal taxon lookup result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonSummary {
    pub id: u64,
    pub name: String,
    pub preferred_common_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_query_requires_every_part() {
        assert!(SpeciesQuery::from_parts(Some(1.0), Some(2.0), Some(50), Some(10)).is_some());
        assert!(SpeciesQuery::from_parts(None, Some(2.0), Some(50), Some(10)).is_none());
        assert!(SpeciesQuery::from_parts(Some(1.0), None, Some(50), Some(10)).is_none());
        assert!(SpeciesQuery::from_parts(Some(1.0), Some(2.0), None, Some(10)).is_none());
        assert!(SpeciesQuery::from_parts(Some(1.0), Some(2.0), Some(50), None).is_none());
        assert!(SpeciesQuery::from_parts(Some(1.0), Some(2.0), Some(50), Some(0)).is_none());
    }

    #[test]
    fn test_species_query_key_equality() {
        let a = SpeciesQuery::from_parts(Some(42.5), Some(-78.1), Some(50), Some(10)).unwrap();
        let b = SpeciesQuery::from_parts(Some(42.5), Some(-78.1), Some(50), Some(10)).unwrap();
        let c = SpeciesQuery::from_parts(Some(42.5), Some(-78.1), Some(50), Some(11)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<SpeciesQuery> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_view_record_link_and_json_shape() {
        let species = SpeciesObservationCount {
            taxon_id: 3017,
            scientific_name: "Columba livia".to_string(),
            common_name: Some("Rock Pigeon".to_string()),
            iconic_taxon_id: Some(3),
            iconic_taxon_name: Some("Aves".to_string()),
            ancestor_ids: Some(vec![48460, 1, 2, 3017]),
            observation_count: 120,
            photo_url: None,
            wikipedia_url: None,
        };
        assert_eq!(species.display_name(), "Rock Pigeon");

        let record = SpeciesViewRecord::new(species, true);
        assert_eq!(record.external_link, "https://www.inaturalist.org/taxa/3017");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["taxon_id"], 3017);
        assert_eq!(json["seen"], true);
    }
}
