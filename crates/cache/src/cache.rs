//! Render cache operations

use crate::brief::BriefHash;
use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::keys::{self, RenderVariant};
use crate::stats::{self, CacheStatistics};
use crate::{Error, Result};
use chrono::{TimeDelta, Utc};
use rendercache_store::KvStore;
use serde::Serialize;

/// Content-addressed cache for rendered creative output
///
/// Maps a render request (brief content + output variant) to a previously
/// produced artifact location. The backing store is injected at construction;
/// the cache holds no other state, so one instance can be shared freely
/// between rendering workers.
pub struct RenderCache<S> {
    store: S,
    config: CacheConfig,
}

impl<S: KvStore> RenderCache<S> {
    /// Create a cache with default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, CacheConfig::default())
    }

    /// Create a cache with explicit configuration
    pub fn with_config(store: S, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a previously rendered variant of `brief`.
    ///
    /// A pure read: never triggers rendering, never retries. Misses are
    /// recorded for absent keys, expired entries (removed on sight) and
    /// undecodable entries (also removed). A store failure is treated as a
    /// miss unless `fail_closed` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] when the brief cannot be hashed, and
    /// [`Error::Store`] for store failures when `fail_closed` is set.
    pub fn lookup<T: Serialize>(
        &self,
        brief: &T,
        variant: &RenderVariant,
    ) -> Result<Option<CacheEntry>> {
        let brief_hash = BriefHash::from_content(brief)?;
        let key = keys::entry_key(&self.config.namespace, &brief_hash, variant);

        let bytes = match self.store.get(&key) {
            Ok(bytes) => bytes,
            Err(e) if self.config.fail_closed => return Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    cache_key = %key,
                    error = %e,
                    "Store unavailable during lookup, treating as miss"
                );
                self.record(stats::MISSES);
                return Ok(None);
            }
        };

        let Some(bytes) = bytes else {
            tracing::debug!(cache_key = %key, variant = %variant, "Cache miss");
            self.record(stats::MISSES);
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(
                    cache_key = %key,
                    error = %e,
                    "Discarding undecodable cache entry"
                );
                self.evict(&key);
                self.record(stats::MISSES);
                return Ok(None);
            }
        };

        if entry.is_expired(Utc::now()) {
            tracing::debug!(cache_key = %key, expires_at = %entry.expires_at, "Cache entry expired");
            self.evict(&key);
            self.record(stats::MISSES);
            return Ok(None);
        }

        tracing::debug!(cache_key = %key, output_location = %entry.output_location, "Cache hit");
        self.record(stats::HITS);
        Ok(Some(entry))
    }

    /// Record a freshly rendered artifact for `brief` and `variant`.
    ///
    /// Overwrites any previous entry under the same key; concurrent writers
    /// settle on last-writer-wins. `ttl_seconds` of `None` applies the
    /// configured default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for a zero or out-of-range TTL,
    /// [`Error::Serialization`] when the brief cannot be hashed, and
    /// [`Error::Store`] when the write fails (the caller decides whether a
    /// lost cache write is worth retrying).
    pub fn store<T: Serialize>(
        &self,
        brief: &T,
        variant: &RenderVariant,
        output_location: &str,
        file_size_bytes: u64,
        render_time_ms: u64,
        ttl_seconds: Option<u64>,
    ) -> Result<CacheEntry> {
        let ttl = ttl_seconds.unwrap_or(self.config.default_ttl_seconds);
        if ttl == 0 {
            return Err(Error::configuration(
                "Entry TTL must be positive; an entry must outlive its creation",
            ));
        }

        let brief_hash = BriefHash::from_content(brief)?;
        let key = keys::entry_key(&self.config.namespace, &brief_hash, variant);

        let created_at = Utc::now();
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| created_at.checked_add_signed(delta))
            .ok_or_else(|| {
                Error::configuration(format!("Entry TTL of {ttl}s is out of range"))
            })?;

        let entry = CacheEntry {
            cache_key: key.clone(),
            brief_hash,
            output_location: output_location.to_string(),
            output_format: variant.format,
            width: variant.width,
            height: variant.height,
            file_size_bytes,
            render_time_ms,
            created_at,
            expires_at,
            metadata: None,
        };

        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| Error::serialization(format!("Failed to serialize entry: {e}")))?;
        self.store.set(&key, &bytes, Some(ttl))?;

        tracing::debug!(
            cache_key = %key,
            variant = %variant,
            ttl_seconds = ttl,
            "Stored render result"
        );
        Ok(entry)
    }

    /// Remove every cached variant of `brief`, across all formats and
    /// dimensions. Returns how many entries were removed; removing nothing
    /// is not an error.
    ///
    /// This is content-addressed invalidation: use it when the brief's
    /// content is known to have changed semantically even though an external
    /// identifier stayed the same.
    ///
    /// # Errors
    ///
    /// Store failures propagate; a swallowed invalidation failure would risk
    /// serving stale renders.
    pub fn invalidate_by_brief<T: Serialize>(&self, brief: &T) -> Result<usize> {
        let brief_hash = BriefHash::from_content(brief)?;
        let prefix = keys::brief_prefix(&self.config.namespace, &brief_hash);

        let matched = self.store.list_keys(&prefix)?;
        if matched.is_empty() {
            return Ok(0);
        }
        let removed = self.store.delete_many(&matched)?;

        tracing::info!(brief_hash = %brief_hash, removed, "Invalidated cached renders");
        Ok(removed)
    }

    /// Current hit/miss counters plus an entry scan for count and size
    ///
    /// # Errors
    ///
    /// Store failures propagate; this is an administrative path with no
    /// fail-open behavior.
    pub fn statistics(&self) -> Result<CacheStatistics> {
        let hits = self.read_counter(stats::HITS)?;
        let misses = self.read_counter(stats::MISSES)?;

        let entry_keys = self
            .store
            .list_keys(&keys::entry_prefix(&self.config.namespace))?;
        let mut total_size_bytes = 0u64;
        for key in &entry_keys {
            if let Some(size) = self.store.memory_usage(key)? {
                total_size_bytes += size;
            }
        }

        Ok(CacheStatistics {
            hits,
            misses,
            hit_rate: stats::hit_rate(hits, misses),
            entry_count: entry_keys.len(),
            total_size_bytes,
        })
    }

    /// Remove every cache entry in this namespace. Counters are left alone.
    ///
    /// # Errors
    ///
    /// Store failures propagate.
    pub fn clear_all(&self) -> Result<usize> {
        let entry_keys = self
            .store
            .list_keys(&keys::entry_prefix(&self.config.namespace))?;
        if entry_keys.is_empty() {
            return Ok(0);
        }
        let removed = self.store.delete_many(&entry_keys)?;
        tracing::info!(removed, "Cleared cache");
        Ok(removed)
    }

    /// Reset hit/miss counters to zero
    ///
    /// # Errors
    ///
    /// Store failures propagate.
    pub fn reset_statistics(&self) -> Result<()> {
        for counter in [stats::HITS, stats::MISSES] {
            self.store
                .delete(&keys::stats_key(&self.config.namespace, counter))?;
        }
        Ok(())
    }

    /// Best-effort counter bump. Counters are informational; a failed bump
    /// must never fail the lookup that triggered it.
    fn record(&self, counter: &str) {
        let key = keys::stats_key(&self.config.namespace, counter);
        if let Err(e) = self.store.increment(&key, 1) {
            tracing::debug!(counter = %key, error = %e, "Failed to record cache statistic");
        }
    }

    /// An increment of zero reads the counter without changing it.
    fn read_counter(&self, counter: &str) -> Result<u64> {
        let key = keys::stats_key(&self.config.namespace, counter);
        Ok(self.store.increment(&key, 0)?)
    }

    /// Best-effort lazy eviction during lookup; the entry is already being
    /// reported absent, so a failed delete only delays physical cleanup.
    fn evict(&self, key: &str) {
        if let Err(e) = self.store.delete(key) {
            tracing::warn!(cache_key = %key, error = %e, "Failed to evict cache entry");
        }
    }
}
