//! Setting definitions
//!
//! Single source of truth for keys, defaults and validation. Keys match the
//! query parameter names of the shareable URL.

use super::{ConfigStore, Setting, SettingMetadata};

/// Number of top species to list
pub struct Limit;

impl Setting for Limit {
    const KEY: &'static str = "limit";
    const DESCRIPTION: &'static str = "Number of top species to list (> 0)";

    type Value = u32;

    fn default_value() -> u32 {
        50
    }

    fn validate(value: &u32) -> Result<(), String> {
        if *value == 0 {
            return Err("limit: must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Search radius around the place, in kilometers
pub struct RadiusKm;

impl Setting for RadiusKm {
    const KEY: &'static str = "radiusKm";
    const DESCRIPTION: &'static str = "Search radius around the place in km (> 0)";

    type Value = u32;

    fn default_value() -> u32 {
        50
    }

    fn validate(value: &u32) -> Result<(), String> {
        if *value == 0 {
            return Err("radiusKm: must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// iNaturalist place id (or slug) the coordinates are derived from
pub struct PlaceId;

impl Setting for PlaceId {
    const KEY: &'static str = "placeId";
    const DESCRIPTION: &'static str = "iNaturalist place id";

    type Value = Option<String>;

    fn default_value() -> Option<String> {
        None
    }

    fn validate(value: &Option<String>) -> Result<(), String> {
        match value {
            Some(id) if id.trim().is_empty() => Err("placeId: must not be blank".to_string()),
            _ => Ok(()),
        }
    }
}

/// iNaturalist user id whose observations mark species as seen
pub struct UserId;

impl Setting for UserId {
    const KEY: &'static str = "userId";
    const DESCRIPTION: &'static str = "iNaturalist user id";

    type Value = Option<u64>;

    fn default_value() -> Option<u64> {
        None
    }
}

impl ConfigStore {
    /// Metadata for every persisted setting, in display order
    pub fn metadata() -> [SettingMetadata; 4] {
        [
            SettingMetadata::of::<Limit>(),
            SettingMetadata::of::<RadiusKm>(),
            SettingMetadata::of::<PlaceId>(),
            SettingMetadata::of::<UserId>(),
        ]
    }

    /// Look up setting metadata by key
    pub fn find_metadata(key: &str) -> Option<SettingMetadata> {
        Self::metadata().into_iter().find(|meta| meta.key == key)
    }
}
