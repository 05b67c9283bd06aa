//! Fetch and reconciliation components
//!
//! Resolvers, fetchers and the history accumulator all go through the
//! [`ObservationApi`] seam and keep their own keyed caches.

pub mod inat_client;
pub mod observation_history;
pub mod query_cache;
pub mod reconciliation;
pub mod resolvers;
pub mod top_species;

pub use inat_client::{INatClient, ObservationApi};
pub use observation_history::{
    ObservationHistoryAccumulator, API_RESULT_WINDOW, OBSERVATIONS_PAGE_SIZE,
};
pub use query_cache::{QueryCache, DEFAULT_FRESHNESS};
pub use reconciliation::{combine, sort_records, SortKey};
pub use resolvers::{PlaceResolver, UserResolver};
pub use top_species::TopSpeciesFetcher;
