//! Keyed in-memory cache with a freshness window
//!
//! Each key owns a slot guarded by an async mutex. The first caller for a key
//! holds the slot while it fetches, so concurrent callers for the same key wait
//! and then read the stored value instead of issuing their own request.
//! Failures are never stored.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// How long a fetched value is served without refetching
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(5 * 60);

struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

type Slot<V> = Arc<tokio::sync::Mutex<Option<CacheEntry<V>>>>;

pub struct QueryCache<K, V> {
    name: &'static str,
    freshness: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self::with_freshness(name, DEFAULT_FRESHNESS)
    }

    pub fn with_freshness(name: &'static str, freshness: Duration) -> Self {
        Self {
            name,
            freshness,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the fresh value for `key`, running `fetch` when there is none
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.freshness {
                tracing::debug!(cache = self.name, key = ?key, "Cache hit");
                return Ok(cached.value.clone());
            }
        }

        tracing::debug!(cache = self.name, key = ?key, "Cache miss, fetching");
        let value = fetch().await?;
        *entry = Some(CacheEntry {
            value: value.clone(),
            fetched_at: Instant::now(),
        });

        Ok(value)
    }

    /// Fresh value for `key` without fetching
    ///
    /// Returns `None` while a fetch for the key is in flight.
    pub fn peek(&self, key: &K) -> Option<V> {
        let slot = self.lock_slots().get(key).cloned()?;
        let entry = slot.try_lock().ok()?;
        let cached = entry.as_ref()?;
        (cached.fetched_at.elapsed() < self.freshness).then(|| cached.value.clone())
    }

    /// Drop every entry except the one for `key`
    pub fn retain_only(&self, key: Option<&K>) {
        let mut slots = self.lock_slots();
        let before = slots.len();
        slots.retain(|k, _| Some(k) == key);
        if slots.len() != before {
            tracing::debug!(cache = self.name, dropped = before - slots.len(), "Discarded entries for previous keys");
        }
    }

    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot for `key`, created on first use
    ///
    /// Also prunes idle slots that hold nothing fresh.
    fn slot(&self, key: &K) -> Slot<V> {
        let mut slots = self.lock_slots();
        let freshness = self.freshness;
        slots.retain(|k, slot| {
            if k == key || Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(entry) => entry
                    .as_ref()
                    .is_some_and(|cached| cached.fetched_at.elapsed() < freshness),
                Err(_) => true,
            }
        });

        slots.entry(key.clone()).or_default().clone()
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_fetch(
        calls: &Arc<AtomicU32>,
        value: u32,
    ) -> impl FnOnce() -> std::future::Ready<Result<u32, String>> {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(value))
        }
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cache: QueryCache<u64, u32> = QueryCache::new("test");
        let calls = Arc::new(AtomicU32::new(0));

        assert_eq!(cache.get_or_fetch(&1, counting_fetch(&calls, 10)).await, Ok(10));
        assert_eq!(cache.get_or_fetch(&1, counting_fetch(&calls, 99)).await, Ok(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.peek(&1), Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_freshness_window() {
        let cache: QueryCache<u64, u32> = QueryCache::new("test");
        let calls = Arc::new(AtomicU32::new(0));

        cache.get_or_fetch(&1, counting_fetch(&calls, 10)).await.unwrap();
        tokio::time::advance(DEFAULT_FRESHNESS - Duration::from_secs(1)).await;
        cache.get_or_fetch(&1, counting_fetch(&calls, 20)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.peek(&1), None);
        assert_eq!(cache.get_or_fetch(&1, counting_fetch(&calls, 20)).await, Ok(20));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_stored() {
        let cache: QueryCache<u64, u32> = QueryCache::new("test");

        let result = cache
            .get_or_fetch(&1, || std::future::ready(Err::<u32, _>("down".to_string())))
            .await;
        assert!(result.is_err());
        assert_eq!(cache.peek(&1), None);

        let calls = Arc::new(AtomicU32::new(0));
        assert_eq!(cache.get_or_fetch(&1, counting_fetch(&calls, 3)).await, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache: QueryCache<u64, u32> = QueryCache::new("test");
        let calls = Arc::new(AtomicU32::new(0));

        let slow_fetch = |value: u32| {
            let calls = calls.clone();
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok::<_, String>(value)
            }
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch(&7, slow_fetch(1)),
            cache.get_or_fetch(&7, slow_fetch(2))
        );

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retain_only_discards_other_keys() {
        let cache: QueryCache<u64, u32> = QueryCache::new("test");
        let calls = Arc::new(AtomicU32::new(0));

        cache.get_or_fetch(&1, counting_fetch(&calls, 1)).await.unwrap();
        cache.get_or_fetch(&2, counting_fetch(&calls, 2)).await.unwrap();
        assert_eq!(cache.len(), 2);

        cache.retain_only(Some(&2));
        assert_eq!(cache.peek(&1), None);
        assert_eq!(cache.peek(&2), Some(2));

        cache.retain_only(None);
        assert!(cache.is_empty());
    }
}
