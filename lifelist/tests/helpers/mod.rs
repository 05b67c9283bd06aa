//! Shared test fixtures: a scripted, call-counting iNaturalist API and
//! settings stores backed by in-memory SQLite

#![allow(dead_code)]

use async_trait::async_trait;
use lifelist::models::{
    Coordinates, ObservationRecord, Place, SpeciesObservationCount, SpeciesQuery, TaxonSummary,
    UserProfile,
};
use lifelist::{FetchError, ObservationApi};
use lifelist_common::settings::{ConfigMirror, QueryStringMirror, StorageMirror};
use lifelist_common::ConfigStore;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Scripted API double
///
/// Each endpoint counts its calls. `fail_*` fields make the next N calls fail
/// with a network error; `failing_page` fails every request for that page.
#[derive(Default)]
pub struct FakeApi {
    pub species: Mutex<Vec<SpeciesObservationCount>>,
    pub pages: Mutex<HashMap<u64, Vec<Vec<ObservationRecord>>>>,
    pub places: Mutex<HashMap<String, Place>>,
    pub users: Mutex<HashMap<u64, UserProfile>>,

    pub fail_species: AtomicU32,
    pub fail_places: AtomicU32,
    pub fail_users: AtomicU32,
    pub failing_page: Mutex<Option<u32>>,

    /// When set, species requests wait for a notification before answering
    pub species_gate: Mutex<Option<Arc<Notify>>>,

    pub species_calls: AtomicU32,
    pub page_calls: AtomicU32,
    pub place_calls: AtomicU32,
    pub user_calls: AtomicU32,
    pub search_calls: AtomicU32,
    pub last_species_query: Mutex<Option<SpeciesQuery>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_species(self: &Arc<Self>, species: Vec<SpeciesObservationCount>) -> &Arc<Self> {
        *self.species.lock().unwrap() = species;
        self
    }

    pub fn with_place(self: &Arc<Self>, place: Place) -> &Arc<Self> {
        self.places.lock().unwrap().insert(place.id.to_string(), place);
        self
    }

    pub fn with_user(self: &Arc<Self>, user: UserProfile) -> &Arc<Self> {
        self.users.lock().unwrap().insert(user.id, user);
        self
    }

    pub fn with_pages(self: &Arc<Self>, user_id: u64, pages: Vec<Vec<ObservationRecord>>) -> &Arc<Self> {
        self.pages.lock().unwrap().insert(user_id, pages);
        self
    }

    pub fn calls(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ObservationApi for FakeApi {
    async fn species_counts(
        &self,
        query: &SpeciesQuery,
    ) -> Result<Vec<SpeciesObservationCount>, FetchError> {
        self.species_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_species_query.lock().unwrap() = Some(*query);

        let gate = self.species_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if Self::take_failure(&self.fail_species) {
            return Err(FetchError::Network("connection reset".to_string()));
        }
        Ok(self.species.lock().unwrap().clone())
    }

    async fn observations_page(
        &self,
        user_id: u64,
        page: u32,
        _per_page: u32,
    ) -> Result<Vec<ObservationRecord>, FetchError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        if *self.failing_page.lock().unwrap() == Some(page) {
            return Err(FetchError::Api(503, "Service Unavailable".to_string()));
        }

        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(&user_id)
            .and_then(|p| p.get(page as usize - 1))
            .cloned()
            .unwrap_or_default())
    }

    async fn place(&self, place_id: &str) -> Result<Option<Place>, FetchError> {
        self.place_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_places) {
            return Err(FetchError::Network("timeout".to_string()));
        }
        Ok(self.places.lock().unwrap().get(place_id).cloned())
    }

    async fn user(&self, user_id: u64) -> Result<Option<UserProfile>, FetchError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_users) {
            return Err(FetchError::Network("timeout".to_string()));
        }
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn taxon(&self, taxon_id: u64) -> Result<Option<TaxonSummary>, FetchError> {
        Ok(Some(TaxonSummary {
            id: taxon_id,
            name: format!("Taxon {}", taxon_id),
            preferred_common_name: None,
        }))
    }

    async fn autocomplete_places(&self, query: &str) -> Result<Vec<Place>, FetchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let query = query.to_lowercase();
        Ok(self
            .places
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.display_name.to_lowercase().contains(&query))
            .cloned()
            .collect())
    }

    async fn autocomplete_users(&self, query: &str) -> Result<Vec<UserProfile>, FetchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.login.contains(query))
            .cloned()
            .collect())
    }
}

pub fn species(taxon_id: u64, observation_count: u64) -> SpeciesObservationCount {
    SpeciesObservationCount {
        taxon_id,
        scientific_name: format!("Taxon {}", taxon_id),
        common_name: None,
        iconic_taxon_id: Some(3),
        iconic_taxon_name: Some("Aves".to_string()),
        ancestor_ids: Some(vec![48460, 1, 2, taxon_id]),
        observation_count,
        photo_url: None,
        wikipedia_url: None,
    }
}

pub fn erie_county() -> Place {
    Place {
        id: 1282,
        display_name: "Erie County, NY, US".to_string(),
        location: Some(Coordinates {
            latitude: 42.76,
            longitude: -78.77,
        }),
    }
}

pub fn user(id: u64, login: &str) -> UserProfile {
    UserProfile {
        id,
        login: login.to_string(),
        display_name: None,
        icon_url: None,
    }
}

pub fn observations(taxa: impl IntoIterator<Item = Option<u64>>) -> Vec<ObservationRecord> {
    taxa.into_iter()
        .map(|taxon_id| ObservationRecord { taxon_id })
        .collect()
}

/// Settings store seeded from `url`, persisted to a fresh in-memory database
pub async fn test_store(url: &str) -> (Arc<ConfigStore>, Arc<QueryStringMirror>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    lifelist_common::db::create_settings_table(&pool).await.unwrap();

    let url_mirror = Arc::new(QueryStringMirror::parse(url).unwrap());
    let storage: Arc<dyn ConfigMirror> = Arc::new(StorageMirror::new(pool));
    let store = ConfigStore::load(url_mirror.clone(), storage).await.unwrap();

    (Arc::new(store), url_mirror)
}
