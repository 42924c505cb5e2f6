//! Partitioned persistence for normalized documentation records.

use super::Partition;
use crate::error::StoreError;
use crate::types::DocRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use xxhash_rust::xxh3::Xxh3;

/// Bumped whenever the persisted record layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// One persisted partition: records plus the layout they were split with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPartition {
    pub version: u32,
    /// Digest of the allow-list used to split the dataset.
    pub layout: u64,
    pub records: HashMap<String, Arc<DocRecord>>,
}

impl StoredPartition {
    pub fn new(layout: u64, records: HashMap<String, Arc<DocRecord>>) -> Self {
        Self {
            version: FORMAT_VERSION,
            layout,
            records,
        }
    }

    /// Whether this partition was written by the current format with the
    /// same allow-list.
    pub fn is_current(&self, layout: u64) -> bool {
        self.version == FORMAT_VERSION && self.layout == layout
    }
}

/// Digest of the common allow-list. Order and duplicates do not matter.
pub fn layout_digest<S: AsRef<str>>(common: &[S]) -> u64 {
    let mut names: Vec<&str> = common.iter().map(AsRef::as_ref).collect();
    names.sort_unstable();
    names.dedup();

    let mut hasher = Xxh3::new();
    hasher.update(&FORMAT_VERSION.to_le_bytes());
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    hasher.digest()
}

/// A keyed store holding the two documentation partitions.
///
/// Writes must be all-or-nothing: a reader sees either the previous
/// partition, the new one, or nothing.
pub trait PartitionStore: Send + Sync + 'static {
    /// Returns `Ok(None)` when the partition has never been written.
    fn read(
        &self,
        partition: Partition,
    ) -> impl Future<Output = Result<Option<StoredPartition>, StoreError>> + Send;

    fn write(
        &self,
        partition: Partition,
        data: Arc<StoredPartition>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Partitions as postcard files in one directory.
#[derive(Debug, Clone)]
pub struct FsPartitionStore {
    dir: PathBuf,
}

impl FsPartitionStore {
    /// Opens the store, creating the directory if needed.
    ///
    /// Fails with [`StoreError::StorageUnavailable`] when the directory cannot
    /// be created or written.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        let unavailable = |source: std::io::Error| StoreError::StorageUnavailable {
            path: dir.clone(),
            source: Arc::new(source),
        };

        tokio::fs::create_dir_all(&dir).await.map_err(unavailable)?;

        // create_dir_all succeeds on an existing read-only directory
        let marker = dir.join(".writable");
        tokio::fs::write(&marker, b"").await.map_err(unavailable)?;
        let _ = tokio::fs::remove_file(&marker).await;

        tracing::debug!(dir = %dir.display(), "Opened partition store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, partition: Partition) -> PathBuf {
        self.dir.join(format!("{}.bin", partition.as_str()))
    }
}

impl PartitionStore for FsPartitionStore {
    async fn read(&self, partition: Partition) -> Result<Option<StoredPartition>, StoreError> {
        let path = self.path_for(partition);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::persist(partition, e)),
        };

        // Deserialize in spawn_blocking since it's CPU intensive
        let stored = tokio::task::spawn_blocking(move || {
            postcard::from_bytes::<StoredPartition>(&bytes)
        })
        .await
        .map_err(|e| StoreError::persist(partition, e))?
        .map_err(|e| StoreError::persist(partition, e))?;

        Ok(Some(stored))
    }

    async fn write(
        &self,
        partition: Partition,
        data: Arc<StoredPartition>,
    ) -> Result<(), StoreError> {
        let path = self.path_for(partition);
        let tmp = path.with_extension("bin.tmp");

        let bytes = tokio::task::spawn_blocking(move || postcard::to_allocvec(&*data))
            .await
            .map_err(|e| StoreError::persist(partition, e))?
            .map_err(|e| StoreError::persist(partition, e))?;

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::persist(partition, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::persist(partition, e));
        }

        tracing::debug!(
            partition = %partition,
            path = %path.display(),
            bytes = bytes.len(),
            "Wrote partition"
        );
        Ok(())
    }
}

/// Process-local partitions, lost with the process.
#[derive(Debug, Default)]
pub struct MemoryPartitionStore {
    partitions: Mutex<HashMap<Partition, Arc<StoredPartition>>>,
}

impl MemoryPartitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, partition: Partition) -> bool {
        self.lock().contains_key(&partition)
    }

    pub fn remove(&self, partition: Partition) {
        self.lock().remove(&partition);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Partition, Arc<StoredPartition>>> {
        self.partitions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartitionStore for MemoryPartitionStore {
    async fn read(&self, partition: Partition) -> Result<Option<StoredPartition>, StoreError> {
        Ok(self.lock().get(&partition).map(|p| (**p).clone()))
    }

    async fn write(
        &self,
        partition: Partition,
        data: Arc<StoredPartition>,
    ) -> Result<(), StoreError> {
        self.lock().insert(partition, data);
        Ok(())
    }
}
