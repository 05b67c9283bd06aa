//! iNaturalist API client
//!
//! All endpoints return `{ "results": [...] }`; lookups by id take the first
//! result and treat an empty list as "not found".

use crate::error::FetchError;
use crate::models::{
    Coordinates, ObservationRecord, Place, SpeciesObservationCount, SpeciesQuery, TaxonSummary,
    UserProfile,
};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("lifelist/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Read-only access to the iNaturalist API
///
/// The fetch components only talk to this trait, so tests can supply a
/// scripted implementation.
#[async_trait]
pub trait ObservationApi: Send + Sync {
    /// Species ranked by observation count around a point
    async fn species_counts(
        &self,
        query: &SpeciesQuery,
    ) -> Result<Vec<SpeciesObservationCount>, FetchError>;

    /// One page of a user's observations, newest first
    async fn observations_page(
        &self,
        user_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ObservationRecord>, FetchError>;

    async fn place(&self, place_id: &str) -> Result<Option<Place>, FetchError>;

    async fn user(&self, user_id: u64) -> Result<Option<UserProfile>, FetchError>;

    async fn taxon(&self, taxon_id: u64) -> Result<Option<TaxonSummary>, FetchError>;

    async fn autocomplete_places(&self, query: &str) -> Result<Vec<Place>, FetchError>;

    async fn autocomplete_users(&self, query: &str) -> Result<Vec<UserProfile>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ResultsPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct WirePhoto {
    square_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireTaxon {
    id: u64,
    name: String,
    preferred_common_name: Option<String>,
    iconic_taxon_id: Option<u64>,
    iconic_taxon_name: Option<String>,
    ancestor_ids: Option<Vec<u64>>,
    default_photo: Option<WirePhoto>,
    wikipedia_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSpeciesCount {
    count: u64,
    taxon: WireTaxon,
}

impl From<WireSpeciesCount> for SpeciesObservationCount {
    fn from(wire: WireSpeciesCount) -> Self {
        let taxon = wire.taxon;
        Self {
            taxon_id: taxon.id,
            scientific_name: taxon.name,
            common_name: taxon.preferred_common_name,
            iconic_taxon_id: taxon.iconic_taxon_id,
            iconic_taxon_name: taxon.iconic_taxon_name,
            ancestor_ids: taxon.ancestor_ids,
            observation_count: wire.count,
            photo_url: taxon.default_photo.and_then(|p| p.square_url),
            wikipedia_url: taxon.wikipedia_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireTaxonRef {
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireObservation {
    taxon: Option<WireTaxonRef>,
}

#[derive(Debug, Deserialize)]
struct WirePlace {
    id: u64,
    display_name: Option<String>,
    name: Option<String>,
    location: Option<String>,
}

impl From<WirePlace> for Place {
    fn from(wire: WirePlace) -> Self {
        let location = wire.location.as_deref().and_then(Coordinates::parse);
        if wire.location.is_some() && location.is_none() {
            tracing::warn!(place_id = wire.id, location = ?wire.location, "Unparseable place location");
        }
        Self {
            id: wire.id,
            display_name: wire.display_name.or(wire.name).unwrap_or_default(),
            location,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireUser {
    id: u64,
    login: String,
    name: Option<String>,
    icon_url: Option<String>,
    icon: Option<String>,
}

impl From<WireUser> for UserProfile {
    fn from(wire: WireUser) -> Self {
        Self {
            id: wire.id,
            login: wire.login,
            display_name: wire.name,
            icon_url: wire.icon_url.or(wire.icon),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireTaxonSummary {
    id: u64,
    name: String,
    preferred_common_name: Option<String>,
}

impl From<WireTaxonSummary> for TaxonSummary {
    fn from(wire: WireTaxonSummary) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            preferred_common_name: wire.preferred_common_name,
        }
    }
}

/// reqwest-backed iNaturalist client
pub struct INatClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl INatClient {
    /// Create a client rooted at `base_url` (e.g. `https://api.inaturalist.org/v1`)
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::Config(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Config(format!(
                "API base URL cannot carry a path: {}",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str], params: &[(&str, String)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }

    async fn get_results<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, FetchError> {
        tracing::debug!(url = %url, "Querying iNaturalist API");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api(status.as_u16(), error_text));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let page: ResultsPage<T> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(page.results)
    }
}

#[async_trait]
impl ObservationApi for INatClient {
    async fn species_counts(
        &self,
        query: &SpeciesQuery,
    ) -> Result<Vec<SpeciesObservationCount>, FetchError> {
        let url = self.endpoint(
            &["observations", "species_counts"],
            &[
                ("lat", query.latitude.to_string()),
                ("lng", query.longitude.to_string()),
                ("radius", query.radius_km.to_string()),
                ("verifiable", "true".to_string()),
                ("spam", "false".to_string()),
                ("locale", "en".to_string()),
                ("per_page", query.limit.to_string()),
                ("order_by", "observation_count".to_string()),
            ],
        );

        let results: Vec<WireSpeciesCount> = self.get_results(url).await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn observations_page(
        &self,
        user_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ObservationRecord>, FetchError> {
        let url = self.endpoint(
            &["observations"],
            &[
                ("user_id", user_id.to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
                ("order_by", "observed_on".to_string()),
                ("order", "desc".to_string()),
            ],
        );

        let results: Vec<WireObservation> = self.get_results(url).await?;
        Ok(results
            .into_iter()
            .map(|o| ObservationRecord {
                taxon_id: o.taxon.and_then(|t| t.id),
            })
            .collect())
    }

    async fn place(&self, place_id: &str) -> Result<Option<Place>, FetchError> {
        let url = self.endpoint(&["places", place_id], &[]);
        let results: Vec<WirePlace> = self.get_results(url).await?;
        Ok(results.into_iter().next().map(Into::into))
    }

    async fn user(&self, user_id: u64) -> Result<Option<UserProfile>, FetchError> {
        let id = user_id.to_string();
        let url = self.endpoint(&["users", &id], &[]);
        let results: Vec<WireUser> = self.get_results(url).await?;
        Ok(results.into_iter().next().map(Into::into))
    }

    async fn taxon(&self, taxon_id: u64) -> Result<Option<TaxonSummary>, FetchError> {
        let id = taxon_id.to_string();
        let url = self.endpoint(&["taxa", &id], &[]);
        let results: Vec<WireTaxonSummary> = self.get_results(url).await?;
        Ok(results.into_iter().next().map(Into::into))
    }

    async fn autocomplete_places(&self, query: &str) -> Result<Vec<Place>, FetchError> {
        let url = self.endpoint(&["places", "autocomplete"], &[("q", query.to_string())]);
        let results: Vec<WirePlace> = self.get_results(url).await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn autocomplete_users(&self, query: &str) -> Result<Vec<UserProfile>, FetchError> {
        let url = self.endpoint(&["users", "autocomplete"], &[("q", query.to_string())]);
        let results: Vec<WireUser> = self.get_results(url).await?;
        Ok(results.into_iter().map(Into::into).collect())
    }
}
