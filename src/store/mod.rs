//! Tiered documentation store.
//!
//! Records live in two persisted partitions: a small "common" partition of
//! high-frequency symbols loaded eagerly at startup, and a "remaining"
//! partition hydrated lazily the first time a lookup misses. When a partition
//! is absent the raw dataset is fetched once per store, split by the common
//! allow-list, normalized, and written back as both partitions.
//!
//! Lookups read only the live in-memory table and never perform I/O.

mod dataset;
pub mod persist;
pub mod source;

pub use persist::{FsPartitionStore, MemoryPartitionStore, PartitionStore, StoredPartition};
pub use source::{DatasetSource, FileSource, StaticSource};

use crate::config::Config;
use crate::error::StoreError;
use crate::types::DocRecord;
use ahash::AHashMap;
use dataset::Split;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Shared single fetch of the dataset, awaited by both tiers.
type SharedSplit = Shared<BoxFuture<'static, Result<Arc<Split>, StoreError>>>;

/// Shared cold-tier load, awaited by every caller of `load_remaining`.
type SharedLoad = Shared<BoxFuture<'static, Result<(), StoreError>>>;

/// Named persistence partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Common,
    Remaining,
}

impl Partition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Remaining => "remaining",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the cold tier.
enum ColdTier {
    NotLoaded,
    Loading(SharedLoad),
    Loaded,
    /// A failed load is not retried until the store is rebuilt.
    Failed(StoreError),
}

struct StoreInner<P, S> {
    docs: RwLock<AHashMap<String, Arc<DocRecord>>>,
    persistence: Option<P>,
    source: S,
    common: HashSet<String>,
    layout: u64,
    /// Dropped once both tiers are in `docs`.
    dataset: Mutex<Option<SharedSplit>>,
    common_loaded: AtomicBool,
    cold: Mutex<ColdTier>,
}

/// Handle to the tiered store. Cloning is cheap and shares state.
pub struct DocStore<P, S> {
    inner: Arc<StoreInner<P, S>>,
}

impl<P, S> Clone for DocStore<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, S> fmt::Debug for DocStore<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocStore")
            .field("records", &self.len())
            .field("persistent", &self.inner.persistence.is_some())
            .field("common_symbols", &self.inner.common.len())
            .field("needs_remaining", &self.needs_remaining())
            .finish()
    }
}

impl DocStore<FsPartitionStore, FileSource> {
    /// Opens the on-disk partition store named by `config`.
    ///
    /// When storage is unavailable the store still works, fetching and
    /// normalizing the whole dataset on every startup.
    pub async fn initialize(config: &Config) -> Self {
        let persistence = match config.storage_dir() {
            Some(dir) => match FsPartitionStore::open(dir).await {
                Ok(store) => Some(store),
                Err(e) => {
                    tracing::warn!(error = %e, "Falling back to direct dataset fetch");
                    None
                }
            },
            None => {
                tracing::warn!("No storage directory on this platform, persistence disabled");
                None
            }
        };

        Self::new(
            persistence,
            FileSource::new(config.dataset_path.clone()),
            &config.common_symbols,
        )
    }
}

impl<P, S> DocStore<P, S> {
    /// Synchronous read of the live table.
    pub fn lookup(&self, key: &str) -> Option<Arc<DocRecord>> {
        self.inner
            .docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// True until the cold tier has been hydrated or has failed.
    pub fn needs_remaining(&self) -> bool {
        matches!(
            *self.inner.cold.lock().unwrap_or_else(PoisonError::into_inner),
            ColdTier::NotLoaded | ColdTier::Loading(_)
        )
    }

    /// True while a cold-tier load has started and not yet settled.
    pub fn remaining_in_flight(&self) -> bool {
        matches!(
            *self.inner.cold.lock().unwrap_or_else(PoisonError::into_inner),
            ColdTier::Loading(_)
        )
    }

    pub fn len(&self) -> usize {
        self.inner
            .docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_persistent(&self) -> bool {
        self.inner.persistence.is_some()
    }

    fn merge<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = (String, Arc<DocRecord>)>,
    {
        let mut docs = self
            .inner
            .docs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = docs.len();
        docs.extend(records);
        docs.len() - before
    }

    /// Merges a partition still shared with the split, copying only keys.
    fn merge_shared(&self, partition: &StoredPartition) -> usize {
        self.merge(
            partition
                .records
                .iter()
                .map(|(name, record)| (name.clone(), Arc::clone(record))),
        )
    }

    /// The dataset fetch, if one was started by this store.
    fn started_dataset(&self) -> Option<SharedSplit> {
        self.inner
            .dataset
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops the fetched split once neither tier can still need it.
    fn release_dataset_if_merged(&self) {
        let cold_loaded = matches!(
            *self.inner.cold.lock().unwrap_or_else(PoisonError::into_inner),
            ColdTier::Loaded
        );
        if !cold_loaded || !self.inner.common_loaded.load(Ordering::SeqCst) {
            return;
        }
        let released = self
            .inner
            .dataset
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            tracing::debug!("Both tiers merged, released fetched dataset");
        }
    }

    #[cfg(test)]
    fn holds_dataset(&self) -> bool {
        self.started_dataset().is_some()
    }
}

impl<P: PartitionStore, S: DatasetSource> DocStore<P, S> {
    pub fn new(persistence: Option<P>, source: S, common_symbols: &[String]) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                docs: RwLock::new(AHashMap::new()),
                persistence,
                source,
                common: common_symbols.iter().cloned().collect(),
                layout: persist::layout_digest(common_symbols),
                dataset: Mutex::new(None),
                common_loaded: AtomicBool::new(false),
                cold: Mutex::new(ColdTier::NotLoaded),
            }),
        }
    }

    /// Loads the common partition into the live table.
    ///
    /// Warm start reads persistence only. Cold start fetches the dataset
    /// once, writes both partitions and merges the common one. A fetch already
    /// started by the cold tier is reused. Calls after a success do nothing.
    pub async fn load_common(&self) -> Result<(), StoreError> {
        if self.inner.common_loaded.load(Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(fetch) = self.started_dataset() {
            let split = fetch.await?;
            let count = self.merge_shared(&split.common);
            tracing::info!(records = count, "Loaded common partition from dataset");
        } else if let Some(stored) = self.read_partition(Partition::Common).await {
            let count = self.merge(stored.records);
            tracing::info!(records = count, "Loaded common partition from persistence");
        } else {
            let split = self.dataset().await?;
            let count = self.merge_shared(&split.common);
            tracing::info!(records = count, "Loaded common partition from dataset");
        }

        self.inner.common_loaded.store(true, Ordering::SeqCst);
        self.release_dataset_if_merged();
        Ok(())
    }

    /// Hydrates the cold tier.
    ///
    /// The state change happens synchronously, so concurrent calls share one
    /// load: the first call starts it, later calls await the same future, and
    /// calls after it settled resolve immediately with the same outcome.
    /// Failures are not retried.
    pub fn load_remaining(&self) -> BoxFuture<'static, Result<(), StoreError>> {
        let mut cold = self.inner.cold.lock().unwrap_or_else(PoisonError::into_inner);
        match &*cold {
            ColdTier::Loaded => return futures::future::ready(Ok(())).boxed(),
            ColdTier::Failed(e) => return futures::future::ready(Err(e.clone())).boxed(),
            ColdTier::Loading(load) => return load.clone().boxed(),
            ColdTier::NotLoaded => {}
        }

        tracing::debug!("Starting cold tier hydration");
        let store = self.clone();
        let load = async move { store.hydrate_remaining().await }
            .boxed()
            .shared();
        *cold = ColdTier::Loading(load.clone());
        load.boxed()
    }

    async fn hydrate_remaining(&self) -> Result<(), StoreError> {
        let result = self.load_remaining_records().await;
        {
            let mut cold = self.inner.cold.lock().unwrap_or_else(PoisonError::into_inner);
            *cold = match &result {
                Ok(count) => {
                    tracing::info!(records = count, "Cold tier hydrated");
                    ColdTier::Loaded
                }
                Err(e) => {
                    tracing::error!(error = %e, "Cold tier hydration failed");
                    ColdTier::Failed(e.clone())
                }
            };
        }
        self.release_dataset_if_merged();
        result.map(|_| ())
    }

    async fn load_remaining_records(&self) -> Result<usize, StoreError> {
        // a split fetched by the common tier is already in memory
        if let Some(fetch) = self.started_dataset() {
            return Ok(self.merge_shared(&fetch.await?.remaining));
        }
        if let Some(stored) = self.read_partition(Partition::Remaining).await {
            return Ok(self.merge(stored.records));
        }
        let split = self.dataset().await?;
        Ok(self.merge_shared(&split.remaining))
    }

    /// The single dataset fetch for this store, started on first use.
    fn dataset(&self) -> SharedSplit {
        let mut slot = self
            .inner
            .dataset
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert_with(|| {
            let store = self.clone();
            async move { store.fetch_and_persist().await.map(Arc::new) }
                .boxed()
                .shared()
        })
        .clone()
    }

    async fn fetch_and_persist(&self) -> Result<Split, StoreError> {
        let bytes = self.inner.source.fetch().await?;

        let common = self.inner.common.clone();
        let layout = self.inner.layout;
        let split = tokio::task::spawn_blocking(move || dataset::prepare(&bytes, &common, layout))
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))??;

        tracing::info!(
            common = split.common.records.len(),
            remaining = split.remaining.records.len(),
            "Split documentation dataset"
        );

        // Remaining first: a present common partition implies a complete split.
        self.write_partition(Partition::Remaining, Arc::clone(&split.remaining))
            .await;
        self.write_partition(Partition::Common, Arc::clone(&split.common))
            .await;

        Ok(split)
    }

    /// Reads a partition, treating unreadable or stale data as absent.
    async fn read_partition(&self, partition: Partition) -> Option<StoredPartition> {
        let persistence = self.inner.persistence.as_ref()?;
        match persistence.read(partition).await {
            Ok(Some(stored)) if stored.is_current(self.inner.layout) => Some(stored),
            Ok(Some(_)) => {
                tracing::info!(partition = %partition, "Persisted partition is stale, ignoring");
                None
            }
            Ok(None) => {
                tracing::debug!(partition = %partition, "Partition not persisted yet");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read partition, treating as absent");
                None
            }
        }
    }

    async fn write_partition(&self, partition: Partition, data: Arc<StoredPartition>) {
        let Some(persistence) = &self.inner.persistence else {
            return;
        };
        if let Err(e) = persistence.write(partition, data).await {
            tracing::warn!(error = %e, "Failed to persist partition");
        }
    }
}
