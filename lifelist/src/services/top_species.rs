//! Ranked species counts around a location

use super::inat_client::ObservationApi;
use super::query_cache::QueryCache;
use crate::error::FetchError;
use crate::models::{SpeciesObservationCount, SpeciesQuery};
use crate::utils::{retry_transient, FETCH_RETRIES};
use std::sync::Arc;

type SpeciesList = Arc<Vec<SpeciesObservationCount>>;

/// Fetches the most-observed species within a radius of a point
///
/// Results keep upstream order (descending observation count) and are cached
/// per exact query.
pub struct TopSpeciesFetcher {
    api: Arc<dyn ObservationApi>,
    cache: QueryCache<SpeciesQuery, SpeciesList>,
}

impl TopSpeciesFetcher {
    pub fn new(api: Arc<dyn ObservationApi>) -> Self {
        Self {
            api,
            cache: QueryCache::new("top_species"),
        }
    }

    /// Fetch from optional parts; any missing part yields an empty list
    /// without a request
    pub async fn fetch(
        &self,
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius_km: Option<u32>,
        limit: Option<u32>,
    ) -> Result<SpeciesList, FetchError> {
        match SpeciesQuery::from_parts(latitude, longitude, radius_km, limit) {
            Some(query) => self.fetch_query(&query).await,
            None => {
                tracing::debug!("Top species query incomplete, skipping fetch");
                Ok(Arc::new(Vec::new()))
            }
        }
    }

    pub async fn fetch_query(&self, query: &SpeciesQuery) -> Result<SpeciesList, FetchError> {
        self.cache
            .get_or_fetch(query, || async {
                let mut species = retry_transient("top species", FETCH_RETRIES, || {
                    self.api.species_counts(query)
                })
                .await?;

                species.truncate(query.limit as usize);

                tracing::info!(
                    latitude = query.latitude,
                    longitude = query.longitude,
                    radius_km = query.radius_km,
                    count = species.len(),
                    "Fetched top species"
                );

                Ok(Arc::new(species))
            })
            .await
    }
}
