//! Persistence mirrors for settings
//!
//! A mirror is an external channel holding one raw (JSON-encoded) entry per
//! setting key. `write(key, None)` removes the entry.

use crate::db::settings::{delete_setting, get_setting, set_setting};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Url;
use sqlx::SqlitePool;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// External persistence channel for settings
#[async_trait]
pub trait ConfigMirror: Send + Sync {
    /// Mirror name for logging
    fn name(&self) -> &'static str;

    /// Raw content stored for `key`, if any
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace (or with `None`, remove) the raw content for `key`
    async fn write(&self, key: &str, value: Option<&str>) -> Result<()>;
}

/// Settings mirrored into the query string of a shareable URL
pub struct QueryStringMirror {
    url: Mutex<Url>,
}

impl QueryStringMirror {
    pub fn new(url: Url) -> Self {
        Self { url: Mutex::new(url) }
    }

    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::Config(format!("Invalid URL {:?}: {}", url, e)))?;
        Ok(Self::new(url))
    }

    /// Current URL, including every mirrored setting
    pub fn url(&self) -> Url {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Url> {
        self.url.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ConfigMirror for QueryStringMirror {
    fn name(&self) -> &'static str {
        "url"
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        let url = self.lock();
        let value = url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned());
        Ok(value)
    }

    async fn write(&self, key: &str, value: Option<&str>) -> Result<()> {
        let mut url = self.lock();

        // Replace in place so unrelated parameters keep their order
        let mut replaced = false;
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (k, v) in url.query_pairs() {
            if k == key {
                if let (Some(new_value), false) = (value, replaced) {
                    pairs.push((k.into_owned(), new_value.to_string()));
                }
                replaced = true;
            } else {
                pairs.push((k.into_owned(), v.into_owned()));
            }
        }
        if let (Some(new_value), false) = (value, replaced) {
            pairs.push((key.to_string(), new_value.to_string()));
        }

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs.iter());
        }
        Ok(())
    }
}

/// Settings mirrored into the SQLite `settings` table
pub struct StorageMirror {
    pool: SqlitePool,
}

impl StorageMirror {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigMirror for StorageMirror {
    fn name(&self) -> &'static str {
        "storage"
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        get_setting(&self.pool, key).await
    }

    async fn write(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => set_setting(&self.pool, key, value).await,
            None => delete_setting(&self.pool, key).await,
        }
    }
}
