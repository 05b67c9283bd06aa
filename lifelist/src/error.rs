//! Error types for lifelist fetches

use thiserror::Error;

/// Failure of a request against the iNaturalist API
///
/// Cloneable so it can sit in a cached query state next to the data it
/// failed to produce.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client could not be set up (bad base URL, HTTP backend failure)
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Api(..))
    }
}
