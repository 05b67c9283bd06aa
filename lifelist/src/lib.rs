//! lifelist library interface
//!
//! Compares the species most observed near a place with the taxa a user has
//! recorded on iNaturalist.

pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod types;
pub mod utils;

pub use crate::error::FetchError;
pub use crate::services::{INatClient, ObservationApi, SortKey};
pub use crate::session::LifeListSession;
pub use crate::types::{DataSource, QueryState};
