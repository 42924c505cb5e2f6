//! Where the raw dataset comes from on a cold start.

use crate::error::StoreError;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

/// Supplies the raw dataset bytes: a JSON object mapping symbol names to
/// records with markup in their descriptions.
pub trait DatasetSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

/// Reads the dataset file shipped alongside the extension.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>, StoreError> {
        tracing::info!(path = %self.path.display(), "Fetching documentation dataset");
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::Fetch(format!("{}: {}", self.path.display(), e)))
    }
}

/// A dataset already in memory, e.g. embedded with `include_bytes!`.
#[derive(Debug, Clone)]
pub struct StaticSource {
    bytes: Arc<[u8]>,
}

impl StaticSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl DatasetSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<u8>, StoreError> {
        Ok(self.bytes.to_vec())
    }
}
