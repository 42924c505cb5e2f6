//! Runtime configuration loaded from TOML, with defaults for every field.

use crate::error::ConfigError;
use crate::resolver::Selector;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// High-frequency drawing functions served from the eager "common" tier.
pub const DEFAULT_COMMON_SYMBOLS: &[&str] = &[
    "createCanvas",
    "background",
    "fill",
    "stroke",
    "noStroke",
    "rect",
    "ellipse",
    "circle",
    "line",
];

/// Maximum number of resolved records kept in the lookup cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Name of the directory under the platform data dir holding partitions.
const STORAGE_DIR_NAME: &str = "hover-docs";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Allow-list of symbols loaded eagerly into the common partition.
    pub common_symbols: Vec<String>,
    pub cache_capacity: usize,
    /// Gap between the pointer and the panel, in pixels, on both axes.
    pub tooltip_offset: f64,
    /// Minimum pointer travel on either axis before the panel follows.
    pub move_threshold: f64,
    /// Minimum time between two repositions of the same panel.
    pub reposition_interval_ms: u64,
    /// `KeyboardEvent.key` value that locks the panel while held.
    pub lock_key: String,
    pub token_selector: Selector,
    pub line_selector: Selector,
    /// Bundled dataset, read on a cold start.
    pub dataset_path: PathBuf,
    /// Directory for persisted partitions. `None` uses the platform data dir.
    pub storage_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            common_symbols: DEFAULT_COMMON_SYMBOLS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            tooltip_offset: 12.0,
            move_threshold: 5.0,
            reposition_interval_ms: 16,
            lock_key: "Alt".to_string(),
            token_selector: Selector::class_prefix(Some("span"), "cm-"),
            line_selector: Selector::class(None, "cm-line"),
            dataset_path: PathBuf::from("p5-ref-slim.json"),
            storage_dir: None,
        }
    }
}

impl Config {
    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "cache_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.tooltip_offset.is_finite() || self.tooltip_offset < 0.0 {
            return Err(ConfigError::Invalid {
                field: "tooltip_offset",
                reason: format!("{} is not a non-negative pixel value", self.tooltip_offset),
            });
        }
        if !self.move_threshold.is_finite() || self.move_threshold < 0.0 {
            return Err(ConfigError::Invalid {
                field: "move_threshold",
                reason: format!("{} is not a non-negative pixel value", self.move_threshold),
            });
        }
        if self.lock_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "lock_key",
                reason: "must name a key".to_string(),
            });
        }
        Ok(())
    }

    pub const fn reposition_interval(&self) -> Duration {
        Duration::from_millis(self.reposition_interval_ms)
    }

    /// Resolved storage directory, if any can be determined on this platform.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(STORAGE_DIR_NAME)))
    }
}
