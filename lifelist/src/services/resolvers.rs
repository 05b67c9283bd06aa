//! Place and user lookups by id
//!
//! Each resolver keeps only the entry for the id it was last asked about;
//! switching ids discards the previous record.

use super::inat_client::ObservationApi;
use super::query_cache::QueryCache;
use crate::error::FetchError;
use crate::models::{Place, UserProfile};
use crate::utils::{retry_transient, FETCH_RETRIES};
use std::sync::Arc;

/// Resolves a configured place id into a [`Place`]
pub struct PlaceResolver {
    api: Arc<dyn ObservationApi>,
    cache: QueryCache<String, Option<Place>>,
}

impl PlaceResolver {
    pub fn new(api: Arc<dyn ObservationApi>) -> Self {
        Self {
            api,
            cache: QueryCache::new("place"),
        }
    }

    /// Look up `place_id`
    ///
    /// An absent or blank id resolves to `None` without a request, as does an
    /// id the API returns no results for.
    pub async fn resolve(&self, place_id: Option<&str>) -> Result<Option<Place>, FetchError> {
        let Some(id) = place_id.map(str::trim).filter(|id| !id.is_empty()) else {
            self.cache.retain_only(None);
            return Ok(None);
        };

        let key = id.to_string();
        self.cache.retain_only(Some(&key));

        let place = self
            .cache
            .get_or_fetch(&key, || {
                retry_transient("place lookup", FETCH_RETRIES, || self.api.place(id))
            })
            .await?;

        match &place {
            Some(p) => tracing::debug!(place_id = %id, name = %p.display_name, "Resolved place"),
            None => tracing::info!(place_id = %id, "Place not found"),
        }

        Ok(place)
    }

    /// Places whose name matches `query`; blank queries match nothing
    pub async fn search(&self, query: &str) -> Result<Vec<Place>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        retry_transient("place search", FETCH_RETRIES, || {
            self.api.autocomplete_places(query)
        })
        .await
    }
}

/// Resolves a configured user id into a [`UserProfile`]
pub struct UserResolver {
    api: Arc<dyn ObservationApi>,
    cache: QueryCache<u64, Option<UserProfile>>,
}

impl UserResolver {
    pub fn new(api: Arc<dyn ObservationApi>) -> Self {
        Self {
            api,
            cache: QueryCache::new("user"),
        }
    }

    pub async fn resolve(&self, user_id: Option<u64>) -> Result<Option<UserProfile>, FetchError> {
        let Some(id) = user_id else {
            self.cache.retain_only(None);
            return Ok(None);
        };

        self.cache.retain_only(Some(&id));

        let user = self
            .cache
            .get_or_fetch(&id, || {
                retry_transient("user lookup", FETCH_RETRIES, || self.api.user(id))
            })
            .await?;

        match &user {
            Some(u) => tracing::debug!(user_id = id, login = %u.login, "Resolved user"),
            None => tracing::info!(user_id = id, "User not found"),
        }

        Ok(user)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<UserProfile>, FetchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        retry_transient("user search", FETCH_RETRIES, || {
            self.api.autocomplete_users(query)
        })
        .await
    }
}
