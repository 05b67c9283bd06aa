//! Write-through setters
//!
//! The URL mirror is written first, then storage. Memory takes the new value
//! only once both mirrors hold it. If storage rejects the write, the URL entry
//! is put back to the previous value and the setter returns the error.

use super::{encode, ConfigMirror, ConfigStore, Setting};
use crate::{Error, Result};
use tracing::{info, trace, warn};

impl ConfigStore {
    /// Validate and update a setting, persisting it to both mirrors
    pub async fn set<S: Setting>(&self, value: S::Value) -> Result<()> {
        S::validate(&value).map_err(Error::InvalidInput)?;
        self.write_through(S::KEY, encode::<S>(&value)).await
    }

    /// Update a setting from its textual form (CLI input)
    ///
    /// `raw` is parsed as JSON; if that fails it is retried as a JSON string,
    /// so `placeId 1292` and `placeId "1292"` are equivalent.
    pub async fn set_raw(&self, key: &str, raw: &str) -> Result<()> {
        let meta = Self::find_metadata(key)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown setting: {}", key)))?;

        let canonical = match (meta.canonicalize)(raw) {
            Ok(value) => value,
            Err(first_error) => {
                let quoted = serde_json::Value::String(raw.to_string()).to_string();
                (meta.canonicalize)(&quoted).map_err(|_| Error::InvalidInput(first_error))?
            }
        };

        self.write_through(meta.key, canonical).await
    }

    /// Reset a setting to its default (unsets optional settings)
    pub async fn reset(&self, key: &str) -> Result<()> {
        let meta = Self::find_metadata(key)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown setting: {}", key)))?;
        self.write_through(meta.key, (meta.default_value)()).await
    }

    async fn write_through(&self, key: &'static str, encoded: Option<String>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let previous = self.encoded(key);

        sync_mirror(self.url.as_ref(), key, encoded.as_deref()).await?;
        if let Err(e) = sync_mirror(self.storage.as_ref(), key, encoded.as_deref()).await {
            if let Err(restore) = sync_mirror(self.url.as_ref(), key, previous.as_deref()).await {
                warn!(key, error = %restore, "Could not restore URL entry after storage failure");
            }
            return Err(e);
        }

        self.write_values().insert(key, encoded.clone());
        info!(key, value = ?encoded, "Setting updated");
        Ok(())
    }
}

/// Write `desired` to `mirror` unless it already holds exactly that content
///
/// Returns whether a write happened.
pub(super) async fn sync_mirror(mirror: &dyn ConfigMirror, key: &str, desired: Option<&str>) -> Result<bool> {
    let current = mirror.read(key).await?;
    if current.as_deref() == desired {
        trace!(mirror = mirror.name(), key, "Mirror already up to date");
        return Ok(false);
    }

    mirror.write(key, desired).await?;
    tracing::debug!(mirror = mirror.name(), key, value = ?desired, "Mirror updated");
    Ok(true)
}
