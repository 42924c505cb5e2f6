//! Error handling types and utilities.

use crate::store::Partition;
use std::path::PathBuf;
use std::sync::Arc;

/// A specialized Result type for top-level hover-docs glue.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` at the edges of the crate.
pub type Result<T> = anyhow::Result<T>;

/// Errors produced while loading documentation records.
///
/// Cloneable so a single failed load can be handed to every caller awaiting
/// the same shared future.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The platform refused access to the persistent store.
    #[error("persistent storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
    /// The dataset could not be fetched.
    #[error("failed to fetch documentation dataset: {0}")]
    Fetch(String),
    /// The dataset was fetched but is not valid JSON of the expected shape.
    #[error("failed to decode documentation dataset: {0}")]
    Decode(String),
    /// Reading or writing a persisted partition failed.
    #[error("persistence error for {partition} partition: {reason}")]
    Persist { partition: Partition, reason: String },
}

impl StoreError {
    pub(crate) fn persist(partition: Partition, reason: impl std::fmt::Display) -> Self {
        Self::Persist {
            partition,
            reason: reason.to_string(),
        }
    }
}

/// Error returned when the configuration file cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
