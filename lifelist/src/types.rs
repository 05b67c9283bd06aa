//! Presentation-facing state types
//!
//! Every fetched source is exposed as a [`QueryState`]: the last data it
//! produced, the error that replaced it, and whether a fetch is outstanding.

use crate::error::FetchError;
use serde::Serialize;
use std::fmt;

// ============================================================================
// Query State
// ============================================================================

/// Tri-state view of one fetched source
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub error: Option<FetchError>,
    pub is_loading: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> QueryState<T> {
    /// Nothing requested yet
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
        }
    }

    pub fn loading() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: true,
        }
    }

    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            is_loading: false,
        }
    }

    pub fn failure(error: FetchError) -> Self {
        Self {
            data: None,
            error: Some(error),
            is_loading: false,
        }
    }

    pub fn from_result(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        QueryState {
            data: self.data.map(f),
            error: self.error,
            is_loading: self.is_loading,
        }
    }
}

// ============================================================================
// Data Sources
// ============================================================================

/// The independently fetched inputs of the species view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Place,
    User,
    TopSpecies,
    ObservedTaxa,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataSource::Place => "place",
            DataSource::User => "user",
            DataSource::TopSpecies => "top species",
            DataSource::ObservedTaxa => "observed taxa",
        };
        write!(f, "{}", name)
    }
}
