//! Fixed-capacity LRU of resolved records in front of the tiered store.

use crate::store::{DatasetSource, DocStore, PartitionStore};
use crate::types::{DocRecord, SymbolKey};
use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

/// Bounded record cache that also kicks off cold-tier hydration on a miss.
pub struct LookupCache<P, S> {
    entries: Mutex<LruCache<SymbolKey, Arc<DocRecord>>>,
    store: DocStore<P, S>,
}

impl<P, S> std::fmt::Debug for LookupCache<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.lock();
        f.debug_struct("LookupCache")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .finish_non_exhaustive()
    }
}

impl<P, S> LookupCache<P, S> {
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Whether `key` is cached, without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    /// Cached keys from most to least recently used.
    pub fn keys(&self) -> Vec<SymbolKey> {
        self.lock().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn store(&self) -> &DocStore<P, S> {
        &self.store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<SymbolKey, Arc<DocRecord>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P: PartitionStore, S: DatasetSource> LookupCache<P, S> {
    pub fn new(store: DocStore<P, S>, capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            store,
        }
    }

    /// Resolves a symbol to its record.
    ///
    /// A miss in both the cache and the live table starts cold-tier hydration
    /// in the background if it has not run yet; this call still returns
    /// `None` and a later call sees the hydrated record.
    pub fn resolve(&self, key: &SymbolKey) -> Option<Arc<DocRecord>> {
        if let Some(record) = self.lock().get(key) {
            tracing::trace!(symbol = %key, "Cache hit");
            return Some(Arc::clone(record));
        }

        if let Some(record) = self.store.lookup(key.as_str()) {
            tracing::debug!(symbol = %key, "Cache miss, found in store");
            self.lock().put(key.clone(), Arc::clone(&record));
            return Some(record);
        }

        if self.store.needs_remaining() {
            tracing::debug!(symbol = %key, "Unknown symbol, hydrating cold tier");
            let load = self.store.load_remaining();
            spawn_detached(async move {
                // hydration logs its own failure
                let _ = load.await;
            });
        }
        None
    }
}

/// Runs `future` on the ambient tokio runtime without awaiting it.
pub(crate) fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(e) => tracing::warn!(error = %e, "No async runtime, background task dropped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryPartitionStore, StaticSource};
    use assert2::{check, let_assert};

    const COMMON: &[&str] = &["rect", "fill"];

    fn dataset(extra: usize) -> Vec<u8> {
        let mut map = serde_json::Map::new();
        for name in COMMON {
            map.insert(
                (*name).to_string(),
                serde_json::json!({ "description": format!("<p>{name} docs</p>") }),
            );
        }
        for i in 0..extra {
            map.insert(
                format!("sym{i}"),
                serde_json::json!({ "description": format!("symbol {i}") }),
            );
        }
        serde_json::to_vec(&map).unwrap()
    }

    fn cache(extra: usize, capacity: usize) -> LookupCache<MemoryPartitionStore, StaticSource> {
        let common: Vec<String> = COMMON.iter().map(|s| (*s).to_string()).collect();
        let store = DocStore::new(
            Some(MemoryPartitionStore::new()),
            StaticSource::new(dataset(extra)),
            &common,
        );
        LookupCache::new(store, NonZeroUsize::new(capacity).unwrap())
    }

    fn key(s: &str) -> SymbolKey {
        SymbolKey::new(s).unwrap()
    }

    #[tokio::test]
    async fn common_symbols_resolve_without_cold_tier() {
        let cache = cache(3, 64);
        cache.store().load_common().await.unwrap();

        let_assert!(Some(record) = cache.resolve(&key("rect")));
        check!(record.description == "rect docs");
        check!(!cache.store().remaining_in_flight());
        check!(cache.store().needs_remaining());
    }

    #[tokio::test]
    async fn miss_returns_none_then_hydrates() {
        let cache = cache(3, 64);
        cache.store().load_common().await.unwrap();

        check!(cache.resolve(&key("sym1")).is_none());
        check!(cache.store().remaining_in_flight());

        cache.store().load_remaining().await.unwrap();
        let_assert!(Some(record) = cache.resolve(&key("sym1")));
        check!(record.description == "symbol 1");
    }

    #[tokio::test]
    async fn unknown_after_hydration_does_not_reload() {
        let cache = cache(1, 64);
        cache.store().load_common().await.unwrap();
        cache.store().load_remaining().await.unwrap();

        check!(cache.resolve(&key("nope")).is_none());
        check!(!cache.store().needs_remaining());
        check!(!cache.store().remaining_in_flight());
    }

    #[tokio::test]
    async fn keeps_most_recent_capacity_entries() {
        let cache = cache(100, 64);
        cache.store().load_common().await.unwrap();
        cache.store().load_remaining().await.unwrap();

        for i in 0..100 {
            check!(cache.resolve(&key(&format!("sym{i}"))).is_some());
        }

        check!(cache.len() == 64);
        for i in 0..36 {
            check!(!cache.contains(&format!("sym{i}")));
        }
        for i in 36..100 {
            check!(cache.contains(&format!("sym{i}")));
        }
    }

    #[tokio::test]
    async fn reads_refresh_recency() {
        let cache = cache(3, 2);
        cache.store().load_common().await.unwrap();
        cache.store().load_remaining().await.unwrap();

        cache.resolve(&key("sym0"));
        cache.resolve(&key("sym1"));
        // touch sym0 so sym1 becomes least recently used
        cache.resolve(&key("sym0"));
        cache.resolve(&key("sym2"));

        check!(cache.contains("sym0"));
        check!(!cache.contains("sym1"));
        check!(cache.keys() == vec![key("sym2"), key("sym0")]);
    }
}
