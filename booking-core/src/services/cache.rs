//! Time-limited request cache with in-flight deduplication.
//!
//! Concurrent lookups of the same key share one fetch; successful results are
//! kept for `ttl`; failures are never cached. When the cache is full the entry
//! closest to expiry is evicted.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;

struct Entry<V> {
    cell: Arc<OnceCell<V>>,
    expires_at: Instant,
}

pub struct RequestCache<K, V> {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> RequestCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(
        ttl: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        // Entries stay consistent across a panic, so a poisoned lock is usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value for `key`, if present, settled and not expired.
    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        let now = Instant::now();
        self.entries()
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.cell.get().cloned())
    }

    /// Returns the cached value for `key` or runs `fetch` to produce it.
    ///
    /// Callers racing on the same key wait for the first fetch instead of
    /// issuing their own.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: K,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.cell_for(&key);

        let result = cell.get_or_try_init(fetch).await.cloned();

        if result.is_err() {
            let mut entries = self.entries();
            let unsettled = entries
                .get(&key)
                .is_some_and(|entry| Arc::ptr_eq(&entry.cell, &cell) && !entry.cell.initialized());
            if unsettled {
                entries.remove(&key);
            }
        }

        result
    }

    fn cell_for(
        &self,
        key: &K,
    ) -> Arc<OnceCell<V>> {
        let now = Instant::now();
        let mut entries = self.entries();

        if let Some(entry) = entries.get(key).filter(|entry| entry.expires_at > now) {
            return entry.cell.clone();
        }

        entries.retain(|_, entry| entry.expires_at > now);
        if entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        let cell = Arc::new(OnceCell::new());
        entries.insert(
            key.clone(),
            Entry {
                cell: cell.clone(),
                expires_at: now + self.ttl,
            },
        );
        cell
    }

    pub fn invalidate(
        &self,
        key: &K,
    ) {
        self.entries().remove(key);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    use super::*;

    fn cache(capacity: usize) -> RequestCache<&'static str, u32> {
        RequestCache::new(Duration::from_secs(30), capacity)
    }

    #[tokio::test(start_paused = true)]
    async fn second_lookup_is_served_from_cache() {
        let cache = cache(10);
        let calls = AtomicUsize::new(0);
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(7)
        };

        assert_eq!(cache.get_or_try_insert_with("a", fetch).await, Ok(7));
        assert_eq!(cache.get_or_try_insert_with("a", fetch).await, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&"a"), Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_lookups_share_one_fetch() {
        let cache = cache(10);
        let calls = AtomicUsize::new(0);
        let fetch = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(50)).await;
            Ok::<_, String>(1)
        };

        let (a, b) = tokio::join!(
            cache.get_or_try_insert_with("k", fetch),
            cache.get_or_try_insert_with("k", fetch),
        );

        assert_eq!((a, b), (Ok(1), Ok(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let cache = cache(10);

        let failed = cache
            .get_or_try_insert_with("k", || async { Err::<u32, _>("down") })
            .await;
        assert_eq!(failed, Err("down"));
        assert!(cache.is_empty());

        let ok = cache
            .get_or_try_insert_with("k", || async { Ok::<_, &str>(3) })
            .await;
        assert_eq!(ok, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = cache(10);
        cache
            .get_or_try_insert_with("k", || async { Ok::<_, String>(1) })
            .await
            .unwrap();

        sleep(Duration::from_secs(31)).await;

        assert_eq!(cache.get(&"k"), None);
        let refreshed = cache
            .get_or_try_insert_with("k", || async { Ok::<_, String>(2) })
            .await;
        assert_eq!(refreshed, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn full_cache_evicts_oldest_entry() {
        let cache = cache(2);
        for (key, value) in [("a", 1), ("b", 2)] {
            cache
                .get_or_try_insert_with(key, || async move { Ok::<_, String>(value) })
                .await
                .unwrap();
            sleep(Duration::from_secs(1)).await;
        }

        cache
            .get_or_try_insert_with("c", || async { Ok::<_, String>(3) })
            .await
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_refetch() {
        let cache = cache(10);
        cache
            .get_or_try_insert_with("k", || async { Ok::<_, String>(1) })
            .await
            .unwrap();

        cache.invalidate(&"k");

        assert_eq!(cache.get(&"k"), None);
    }
}
