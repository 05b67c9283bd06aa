//! Life list session
//!
//! Owns the fetch components and the shared [`ConfigStore`] handle, and
//! exposes one [`QueryState`] per source plus the reconciled species view.
//!
//! Every stored state remembers the inputs it was fetched for. A state is
//! only applied, and only served, while those inputs still match the current
//! configuration, so a response for superseded settings never reaches the
//! display.

use crate::error::FetchError;
use crate::models::{
    ObservedTaxonSet, Place, SpeciesObservationCount, SpeciesQuery, SpeciesViewRecord,
    UserProfile,
};
use crate::services::{
    combine, sort_records, ObservationApi, ObservationHistoryAccumulator, PlaceResolver,
    SortKey, TopSpeciesFetcher, UserResolver,
};
use crate::types::{DataSource, QueryState};
use lifelist_common::settings::{PlaceId, UserId};
use lifelist_common::{ConfigStore, Configuration};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SpeciesList = Arc<Vec<SpeciesObservationCount>>;

/// Configuration inputs the top-species list depends on
#[derive(Debug, Clone, PartialEq)]
struct SpeciesInputs {
    place_id: Option<String>,
    radius_km: u32,
    limit: u32,
}

impl SpeciesInputs {
    fn of(config: &Configuration) -> Self {
        Self {
            place_id: config.place_id.clone(),
            radius_km: config.radius_km,
            limit: config.limit,
        }
    }
}

/// A query state together with the inputs it belongs to
struct Tracked<K, T> {
    key: Option<K>,
    state: QueryState<T>,
}

impl<K: PartialEq, T: Clone> Tracked<K, T> {
    fn new() -> Self {
        Self {
            key: None,
            state: QueryState::idle(),
        }
    }

    fn current(&self, key: &K) -> QueryState<T> {
        if self.key.as_ref() == Some(key) {
            self.state.clone()
        } else {
            QueryState::idle()
        }
    }
}

pub struct LifeListSession {
    config: Arc<ConfigStore>,
    places: PlaceResolver,
    users: UserResolver,
    top_species: TopSpeciesFetcher,
    history: ObservationHistoryAccumulator,
    place_state: Mutex<Tracked<Option<String>, Option<Place>>>,
    user_state: Mutex<Tracked<Option<u64>, Option<UserProfile>>>,
    species_state: Mutex<Tracked<SpeciesInputs, SpeciesList>>,
    observed_state: Mutex<Tracked<Option<u64>, Arc<ObservedTaxonSet>>>,
}

impl LifeListSession {
    pub fn new(config: Arc<ConfigStore>, api: Arc<dyn ObservationApi>) -> Self {
        Self {
            config,
            places: PlaceResolver::new(api.clone()),
            users: UserResolver::new(api.clone()),
            top_species: TopSpeciesFetcher::new(api.clone()),
            history: ObservationHistoryAccumulator::new(api),
            place_state: Mutex::new(Tracked::new()),
            user_state: Mutex::new(Tracked::new()),
            species_state: Mutex::new(Tracked::new()),
            observed_state: Mutex::new(Tracked::new()),
        }
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn place_resolver(&self) -> &PlaceResolver {
        &self.places
    }

    pub fn user_resolver(&self) -> &UserResolver {
        &self.users
    }

    /// Fetch every source for the current configuration
    ///
    /// The place lookup and the top-species request run in sequence (the
    /// species query needs the place's coordinates); the user lookup and the
    /// observation history run alongside them.
    pub async fn refresh(&self) {
        let config = self.config.snapshot();
        let place_key = config.place_id.clone();
        let user_key = config.user_id;
        let species_key = SpeciesInputs::of(&config);

        mark_loading(&self.place_state, &place_key);
        mark_loading(&self.user_state, &user_key);
        mark_loading(&self.species_state, &species_key);
        mark_loading(&self.observed_state, &user_key);

        let place_then_species = async {
            let place = self.places.resolve(place_key.as_deref()).await;
            let coordinates = place
                .as_ref()
                .ok()
                .and_then(|p| p.as_ref())
                .and_then(|p| p.location);
            self.apply(&self.place_state, place_key.clone(), place, current_place_key);

            let species = self
                .top_species
                .fetch(
                    coordinates.map(|c| c.latitude),
                    coordinates.map(|c| c.longitude),
                    Some(config.radius_km),
                    Some(config.limit),
                )
                .await;
            self.apply(&self.species_state, species_key.clone(), species, SpeciesInputs::of);
        };

        let user = async {
            let user = self.users.resolve(user_key).await;
            self.apply(&self.user_state, user_key, user, current_user_key);
        };

        let observed = async {
            let observed = self.history.fetch_all(user_key).await;
            self.apply(&self.observed_state, user_key, observed, current_user_key);
        };

        tokio::join!(place_then_species, user, observed);
    }

    /// Store `result` unless the configuration moved on while it was fetched
    fn apply<K, T>(
        &self,
        slot: &Mutex<Tracked<K, T>>,
        key: K,
        result: Result<T, FetchError>,
        current_key: fn(&Configuration) -> K,
    ) where
        K: PartialEq + std::fmt::Debug,
    {
        let now = current_key(&self.config.snapshot());
        if now != key {
            tracing::debug!(fetched_for = ?key, current = ?now, "Discarding stale result");
            return;
        }

        let mut tracked = lock(slot);
        tracked.key = Some(key);
        tracked.state = QueryState::from_result(result);
    }

    /// Current settings, with coordinates taken from the resolved place
    pub fn configuration(&self) -> Configuration {
        let config = self.config.snapshot();
        let coordinates = self
            .place()
            .data
            .flatten()
            .and_then(|p| p.location)
            .map(|c| c.as_pair());
        config.with_coordinates(coordinates)
    }

    pub fn place(&self) -> QueryState<Option<Place>> {
        lock(&self.place_state).current(&self.config.get::<PlaceId>())
    }

    pub fn user(&self) -> QueryState<Option<UserProfile>> {
        lock(&self.user_state).current(&self.config.get::<UserId>())
    }

    pub fn top_species(&self) -> QueryState<SpeciesList> {
        lock(&self.species_state).current(&SpeciesInputs::of(&self.config.snapshot()))
    }

    pub fn observed_taxa(&self) -> QueryState<Arc<ObservedTaxonSet>> {
        lock(&self.observed_state).current(&self.config.get::<UserId>())
    }

    /// Top species annotated with seen status and sorted
    ///
    /// Follows the top-species state; while the observed taxa are loading or
    /// failed, every record is unseen.
    pub fn species_view(&self, sort: Option<SortKey>) -> QueryState<Vec<SpeciesViewRecord>> {
        let observed = self.observed_taxa().data;
        self.top_species().map(|top| {
            let records = combine(&top, observed.as_deref());
            sort_records(records, sort.unwrap_or_default())
        })
    }

    /// Setting keys that must be filled in before the view can be shown
    pub fn missing_configuration(&self) -> Vec<&'static str> {
        let config = self.config.snapshot();
        let mut missing = Vec::new();
        if config.place_id.is_none() {
            missing.push("placeId");
        }
        if config.user_id.is_none() {
            missing.push("userId");
        }
        missing
    }

    /// Coordinates could not be derived from a resolved place
    pub fn place_lacks_location(&self) -> bool {
        matches!(self.place().data, Some(Some(ref p)) if p.location.is_none())
    }

    /// The current error of every failing source
    pub fn errors(&self) -> Vec<(DataSource, FetchError)> {
        [
            (DataSource::Place, self.place().error),
            (DataSource::User, self.user().error),
            (DataSource::TopSpecies, self.top_species().error),
            (DataSource::ObservedTaxa, self.observed_taxa().error),
        ]
        .into_iter()
        .filter_map(|(source, error)| error.map(|e| (source, e)))
        .collect()
    }

    /// Species query the current state would issue, if complete
    pub fn species_query(&self) -> Option<SpeciesQuery> {
        let config = self.configuration();
        SpeciesQuery::from_parts(
            config.latitude,
            config.longitude,
            Some(config.radius_km),
            Some(config.limit),
        )
    }
}

fn current_place_key(config: &Configuration) -> Option<String> {
    config.place_id.clone()
}

fn current_user_key(config: &Configuration) -> Option<u64> {
    config.user_id
}

fn mark_loading<K: Clone, T>(slot: &Mutex<Tracked<K, T>>, key: &K) {
    let mut tracked = lock(slot);
    tracked.key = Some(key.clone());
    tracked.state = QueryState::loading();
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
