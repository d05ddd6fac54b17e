//! Cached render result record

use crate::brief::BriefHash;
use crate::keys::OutputFormat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cached render result
///
/// Entries are immutable once written; a re-render of the same brief and
/// variant overwrites the key with a fresh entry. `output_location` is opaque
/// to the cache and never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Store key this entry is filed under
    pub cache_key: String,
    /// Content hash of the brief that produced this render
    pub brief_hash: BriefHash,
    /// URL or path of the produced artifact
    pub output_location: String,
    /// Output container format
    pub output_format: OutputFormat,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Size of the produced artifact in bytes
    pub file_size_bytes: u64,
    /// How long the render took
    pub render_time_ms: u64,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry stops being served
    pub expires_at: DateTime<Utc>,
    /// Free-form annotations from the rendering pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

impl CacheEntry {
    /// Whether the entry must be treated as absent at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
