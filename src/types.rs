//! Core record and key types shared by the store, cache and presenter.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Lookup key for a documentation record: the trimmed text of a hovered token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolKey(String);

impl SymbolKey {
    /// Builds a key from raw token text. Returns `None` when nothing is left
    /// after trimming.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SymbolKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A documentation record after normalization. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    /// Plain-text description.
    pub description: String,
    /// Parameters in declaration order.
    pub params: Vec<ParamDoc>,
    /// Return value, when the dataset documents one.
    pub returns: Option<ReturnDoc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDoc {
    pub name: String,
    pub type_label: String,
    pub optional: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnDoc {
    pub type_label: String,
    pub description: String,
}

/// A record exactly as it appears in the bundled dataset, markup included.
///
/// Every field is optional so malformed entries still decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) params: Option<Vec<RawParam>>,
    #[serde(default, rename = "return")]
    pub(crate) returns: Option<RawReturn>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawParam {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default, rename = "type")]
    pub(crate) type_label: Option<String>,
    #[serde(default)]
    pub(crate) optional: Option<bool>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawReturn {
    #[serde(default, rename = "type")]
    pub(crate) type_label: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}
