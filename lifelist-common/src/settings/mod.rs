//! Persisted viewing preferences
//!
//! # Architecture
//!
//! One authoritative in-memory value per setting, mirrored to two external
//! channels:
//! - the shareable URL query string ([`QueryStringMirror`])
//! - durable storage, the SQLite `settings` table ([`StorageMirror`])
//!
//! Startup precedence is URL, then storage, then the compiled default. After
//! loading, both mirrors are brought in line with the resolved value, so a
//! URL value overwrites a disagreeing stored value.
//!
//! Every mirror write is preceded by a read of the mirror's current content
//! and skipped when it already holds the same encoding. Mirrors that notify
//! on change therefore never see a write that would echo back.
//!
//! # Encoding
//!
//! Values are JSON-encoded. A value whose encoding is JSON `null` (an unset
//! optional setting) is stored as the absence of the entry. A stored value
//! that fails to decode or validate is logged and replaced by the next
//! source in precedence order; it is never surfaced as an error.
//!
//! # Usage
//!
//! ```rust,ignore
//! use lifelist_common::settings::{ConfigStore, Limit};
//!
//! let store = Arc::new(ConfigStore::load(url_mirror, storage_mirror).await?);
//! store.set::<Limit>(25).await?;
//! assert_eq!(store.get::<Limit>(), 25);
//! ```

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod init;
mod metadata;
mod mirror;
mod setters;

pub use metadata::{Limit, PlaceId, RadiusKm, UserId};
pub use mirror::{ConfigMirror, QueryStringMirror, StorageMirror};

/// A named, typed configuration scalar
pub trait Setting {
    /// Storage key and URL query parameter name
    const KEY: &'static str;
    /// Human-readable description
    const DESCRIPTION: &'static str;

    type Value: Serialize + DeserializeOwned + Clone + PartialEq + Send + Sync + 'static;

    fn default_value() -> Self::Value;

    /// Reject values that decode but are out of range
    fn validate(_value: &Self::Value) -> Result<(), String> {
        Ok(())
    }
}

/// Encode a value for the mirrors; `None` means "no entry"
pub fn encode<S: Setting>(value: &S::Value) -> Option<String> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Null) => None,
        Ok(json) => Some(json.to_string()),
        Err(e) => {
            tracing::warn!(key = S::KEY, "Failed to encode setting: {}", e);
            None
        }
    }
}

/// Decode and validate a mirror's raw content
pub fn decode<S: Setting>(raw: &str) -> Result<S::Value, String> {
    let value: S::Value =
        serde_json::from_str(raw).map_err(|e| format!("{}: invalid value {:?} ({})", S::KEY, raw, e))?;
    S::validate(&value)?;
    Ok(value)
}

/// Metadata for a single setting, usable without knowing its value type
///
/// Lets the store load, list and set settings by key (e.g. from the CLI)
/// while keeping each type's encode/decode rules in one place.
#[derive(Clone, Copy)]
pub struct SettingMetadata {
    pub key: &'static str,
    pub description: &'static str,
    /// Canonical encoding of the default value
    pub default_value: fn() -> Option<String>,
    /// Decode, validate and re-encode raw content
    pub canonicalize: fn(&str) -> Result<Option<String>, String>,
}

impl SettingMetadata {
    pub fn of<S: Setting>() -> Self {
        Self {
            key: S::KEY,
            description: S::DESCRIPTION,
            default_value: || encode::<S>(&S::default_value()),
            canonicalize: |raw| decode::<S>(raw).map(|value| encode::<S>(&value)),
        }
    }
}

impl std::fmt::Debug for SettingMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingMetadata")
            .field("key", &self.key)
            .field("description", &self.description)
            .finish()
    }
}

/// Snapshot of the full configuration
///
/// `latitude`/`longitude` are never persisted; they are derived from the
/// resolved place and attached with [`Configuration::with_coordinates`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub limit: u32,
    pub radius_km: u32,
    pub place_id: Option<String>,
    pub user_id: Option<u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Configuration {
    pub fn with_coordinates(mut self, coordinates: Option<(f64, f64)>) -> Self {
        self.latitude = coordinates.map(|(lat, _)| lat);
        self.longitude = coordinates.map(|(_, lng)| lng);
        self
    }
}

/// Settings store shared by every consumer through an `Arc`
pub struct ConfigStore {
    /// Canonical encodings keyed by setting key; `None` is an unset optional
    values: RwLock<HashMap<&'static str, Option<String>>>,
    url: Arc<dyn ConfigMirror>,
    storage: Arc<dyn ConfigMirror>,
    /// Serializes setters so mirror writes follow memory writes in order
    write_lock: tokio::sync::Mutex<()>,
}

impl ConfigStore {
    /// Current in-memory value of a setting
    pub fn get<S: Setting>(&self) -> S::Value {
        let encoded = self.read_values().get(S::KEY).cloned().flatten();
        decode::<S>(encoded.as_deref().unwrap_or("null")).unwrap_or_else(|_| S::default_value())
    }

    /// Canonical encoding currently held for `key`
    pub fn encoded(&self, key: &str) -> Option<String> {
        self.read_values().get(key).cloned().flatten()
    }

    /// Persisted part of the configuration (no coordinates)
    pub fn snapshot(&self) -> Configuration {
        Configuration {
            limit: self.get::<Limit>(),
            radius_km: self.get::<RadiusKm>(),
            place_id: self.get::<PlaceId>(),
            user_id: self.get::<UserId>(),
            latitude: None,
            longitude: None,
        }
    }

    fn read_values(&self) -> RwLockReadGuard<'_, HashMap<&'static str, Option<String>>> {
        self.values.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_values(&self) -> RwLockWriteGuard<'_, HashMap<&'static str, Option<String>>> {
        self.values.write().unwrap_or_else(PoisonError::into_inner)
    }
}
