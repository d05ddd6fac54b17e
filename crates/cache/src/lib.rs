//! Content-addressed caching for rendered creative output
//!
//! This crate decides deterministically whether an equivalent render output
//! already exists, so the rendering pipeline never produces the same
//! artifact twice:
//! - Brief canonicalization and content hashing
//! - Cache-key derivation per output format and dimensions
//! - Lookup with lazy expiry, store with native TTL, content-addressed
//!   invalidation
//! - Store-backed hit/miss statistics shared across rendering workers
//!
//! # Key structure
//!
//! ```text
//! {namespace}:entry:{brief_hash}:{variant_digest}   one render result
//! {namespace}:stats:{hits|misses}                   shared counters
//! ```
//!
//! The brief hash is a SHA-256 digest of the brief's canonical JSON encoding
//! (object keys sorted at every depth), so structurally equal briefs address
//! the same entries regardless of field order. The variant digest folds
//! output format and dimensions into the key, keeping a 1920x1080 mp4 and a
//! 1280x720 webm of the same brief addressably distinct while sharing the
//! brief-hash prefix that invalidation scans.
//!
//! # Failure policy
//!
//! Lookups fail open: when the backing store is unreachable the cache
//! reports a miss and the pipeline re-renders, trading cache efficiency for
//! availability ([`CacheConfig::fail_closed`] flips this). Writes and
//! invalidations propagate store errors, because a silently lost
//! invalidation risks serving stale renders. The cache never retries
//! internally.
//!
//! # Usage
//!
//! ```rust
//! use rendercache::{OutputFormat, RenderCache, RenderVariant};
//! use rendercache_store::MemoryStore;
//!
//! let cache = RenderCache::new(MemoryStore::new());
//! let brief = serde_json::json!({
//!     "id": "campaign-1",
//!     "title": "Summer Sale",
//!     "sections": [{"type": "headline", "text": "Amazing Summer Deals"}],
//! });
//! let variant = RenderVariant::new(OutputFormat::Mp4, 1920, 1080)?;
//!
//! if cache.lookup(&brief, &variant)?.is_none() {
//!     // render, then record the produced artifact
//!     cache.store(&brief, &variant, "https://cdn.example.com/out.mp4", 1_048_576, 5_300, None)?;
//! }
//! let entry = cache.lookup(&brief, &variant)?.expect("stored above");
//! assert_eq!(entry.output_location, "https://cdn.example.com/out.mp4");
//! # Ok::<(), rendercache::Error>(())
//! ```

mod brief;
mod cache;
mod config;
mod entry;
mod error;
mod keys;
mod stats;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use brief::{BriefHash, canonical_json, hash_brief};
pub use cache::RenderCache;
pub use config::{CacheConfig, DEFAULT_NAMESPACE, DEFAULT_TTL_SECONDS};
pub use entry::CacheEntry;
pub use keys::{OutputFormat, RenderVariant, brief_prefix, entry_key, entry_prefix};
pub use stats::CacheStatistics;
