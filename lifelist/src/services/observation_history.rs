//! Full observation history of a user, reduced to the taxa they have seen
//!
//! The API does not reliably report a total, so pages are requested until one
//! comes back short. A failure on any page abandons the whole pass.
//!
//! The API serves at most [`API_RESULT_WINDOW`] records through paging and
//! refuses pages beyond that. A user with more observations than the window
//! therefore gets a failed pass rather than a partial set. Walking past the
//! window would need `id_above` cursors instead of page numbers.

use super::inat_client::ObservationApi;
use super::query_cache::QueryCache;
use crate::error::FetchError;
use crate::models::ObservedTaxonSet;
use std::collections::HashSet;
use std::sync::Arc;

/// Records requested per page
pub const OBSERVATIONS_PAGE_SIZE: u32 = 200;

/// Deepest record the API will serve through `page`/`per_page` paging
pub const API_RESULT_WINDOW: u32 = 10_000;

pub struct ObservationHistoryAccumulator {
    api: Arc<dyn ObservationApi>,
    cache: QueryCache<u64, Arc<ObservedTaxonSet>>,
}

impl ObservationHistoryAccumulator {
    pub fn new(api: Arc<dyn ObservationApi>) -> Self {
        Self {
            api,
            cache: QueryCache::new("observed_taxa"),
        }
    }

    /// Distinct taxon ids across every observation of `user_id`
    ///
    /// `None` yields an empty set without any request.
    pub async fn fetch_all(
        &self,
        user_id: Option<u64>,
    ) -> Result<Arc<ObservedTaxonSet>, FetchError> {
        let Some(user_id) = user_id else {
            return Ok(Arc::new(ObservedTaxonSet::default()));
        };

        self.cache
            .get_or_fetch(&user_id, || self.accumulate(user_id))
            .await
    }

    pub fn cached(&self, user_id: u64) -> Option<Arc<ObservedTaxonSet>> {
        self.cache.peek(&user_id)
    }

    async fn accumulate(&self, user_id: u64) -> Result<Arc<ObservedTaxonSet>, FetchError> {
        let mut taxa = HashSet::new();
        let mut page = 1;
        let mut records = 0usize;

        loop {
            let batch = self
                .api
                .observations_page(user_id, page, OBSERVATIONS_PAGE_SIZE)
                .await
                .map_err(|e| {
                    tracing::warn!(user_id, page, error = %e, "Observation history page failed");
                    e
                })?;

            let batch_len = batch.len();
            records += batch_len;
            taxa.extend(batch.into_iter().filter_map(|record| record.taxon_id));

            tracing::debug!(user_id, page, records = batch_len, "Fetched observation page");

            if batch_len < OBSERVATIONS_PAGE_SIZE as usize {
                break;
            }
            if page * OBSERVATIONS_PAGE_SIZE == API_RESULT_WINDOW {
                tracing::warn!(
                    user_id,
                    records,
                    "Observation history reaches the API result window, later pages may be refused"
                );
            }
            page += 1;
        }

        tracing::info!(
            user_id,
            pages = page,
            observations = records,
            taxa = taxa.len(),
            "Accumulated observation history"
        );

        Ok(Arc::new(ObservedTaxonSet::from(taxa)))
    }
}
