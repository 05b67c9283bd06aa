//! Startup loading and mirror convergence

use super::setters::sync_mirror;
use super::{ConfigMirror, ConfigStore, SettingMetadata};
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

impl ConfigStore {
    /// Load every setting and converge both mirrors
    ///
    /// Per setting, the first usable value wins (an explicit JSON `null` counts
    /// as a value and unsets an optional setting):
    /// 1. URL mirror
    /// 2. Storage mirror
    /// 3. Compiled default
    ///
    /// The winning value is then written to each mirror that does not already
    /// hold it, so a URL value overwrites disagreeing storage and defaults
    /// become visible in both channels.
    ///
    /// # Error Handling
    ///
    /// - Mirror I/O failure: return Err (fail startup)
    /// - Malformed or out-of-range content: log WARN, fall through, continue
    pub async fn load(url: Arc<dyn ConfigMirror>, storage: Arc<dyn ConfigMirror>) -> Result<Self> {
        let mut values = HashMap::new();

        for meta in Self::metadata() {
            let from_url = read_candidate(url.as_ref(), &meta).await?;
            let from_storage = match from_url {
                Some(_) => None,
                None => read_candidate(storage.as_ref(), &meta).await?,
            };

            let (resolved, source) = match (from_url, from_storage) {
                (Some(value), _) => (value, url.name()),
                (None, Some(value)) => (value, storage.name()),
                (None, None) => ((meta.default_value)(), "default"),
            };

            sync_mirror(url.as_ref(), meta.key, resolved.as_deref()).await?;
            sync_mirror(storage.as_ref(), meta.key, resolved.as_deref()).await?;

            tracing::debug!(key = meta.key, value = ?resolved, source, "Setting resolved");
            values.insert(meta.key, resolved);
        }

        info!(settings = values.len(), "Configuration loaded");

        Ok(Self {
            values: RwLock::new(values),
            url,
            storage,
            write_lock: tokio::sync::Mutex::new(()),
        })
    }
}

/// Canonical value held by `mirror` for `meta`
///
/// `None` when the entry is absent or unusable. `Some(None)` when the mirror
/// holds an explicit `null`.
async fn read_candidate(mirror: &dyn ConfigMirror, meta: &SettingMetadata) -> Result<Option<Option<String>>> {
    let Some(raw) = mirror.read(meta.key).await? else {
        return Ok(None);
    };

    match (meta.canonicalize)(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(mirror = mirror.name(), "{}, ignoring", e);
            Ok(None)
        }
    }
}
