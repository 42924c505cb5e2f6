//! Decoding the bundled dataset and splitting it into persisted partitions.

use super::persist::StoredPartition;
use crate::error::StoreError;
use crate::normalize::{normalize, normalize_opt};
use crate::types::{DocRecord, ParamDoc, RawRecord, ReturnDoc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The dataset after one fetch: hot and cold partitions, already normalized.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) common: Arc<StoredPartition>,
    pub(crate) remaining: Arc<StoredPartition>,
}

/// Decodes, normalizes and partitions the raw dataset.
pub(crate) fn prepare(
    bytes: &[u8],
    common: &HashSet<String>,
    layout: u64,
) -> Result<Split, StoreError> {
    let raw: HashMap<String, RawRecord> =
        serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))?;

    let mut hot = HashMap::new();
    let mut cold = HashMap::with_capacity(raw.len());
    for (name, record) in raw {
        let record = Arc::new(normalize_record(record));
        if common.contains(&name) {
            hot.insert(name, record);
        } else {
            cold.insert(name, record);
        }
    }

    Ok(Split {
        common: Arc::new(StoredPartition::new(layout, hot)),
        remaining: Arc::new(StoredPartition::new(layout, cold)),
    })
}

pub(crate) fn normalize_record(raw: RawRecord) -> DocRecord {
    let params = raw
        .params
        .unwrap_or_default()
        .into_iter()
        .map(|p| ParamDoc {
            name: p.name.trim().to_string(),
            type_label: p.type_label.unwrap_or_default(),
            optional: p.optional.unwrap_or(false),
            description: normalize_opt(p.description.as_deref()),
        })
        .collect();

    let returns = raw.returns.and_then(|r| {
        let type_label = r.type_label.unwrap_or_default();
        let description = normalize_opt(r.description.as_deref());
        if type_label.is_empty() && description.is_empty() {
            None
        } else {
            Some(ReturnDoc {
                type_label,
                description,
            })
        }
    });

    DocRecord {
        description: raw.description.as_deref().map(normalize).unwrap_or_default(),
        params,
        returns,
    }
}
