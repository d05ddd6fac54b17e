//! Key-value store contract for the rendercache crates
//!
//! The cache layer is store-agnostic: it talks to any backend through the
//! [`KvStore`] trait, which models the subset of a hosted cache service the
//! render cache actually needs, most importantly TTL-bearing writes and
//! atomic counters for statistics shared across workers.
//!
//! Two backends ship in this crate:
//! - [`MemoryStore`]: mutex-protected map, used by tests and local development
//! - [`FilesystemStore`]: one file per key with atomic replace and expiry
//!   sidecars, for persistent single-host deployments
//!
//! Both enforce expiry on read: an expired key is physically removed and
//! reported absent, the same behavior a hosted store's native TTL provides.

mod error;
pub mod filesystem;
pub mod memory;
pub mod root;

pub use error::{Error, Result};
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

/// Contract between the render cache and its backing key-value store.
///
/// Implementations must be usable from multiple rendering workers at once;
/// `set` is an atomic overwrite (last writer wins) and `increment` is an
/// atomic read-modify-write.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent or its TTL has elapsed;
    /// expired keys are removed as a side effect.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, overwriting any previous value.
    ///
    /// `ttl_seconds` sets the store-native expiry; `None` keeps the key until
    /// it is deleted (used for counters).
    fn set(&self, key: &str, value: &[u8], ttl_seconds: Option<u64>) -> Result<()>;

    /// Remove `key`. Absent keys are not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// Remove every key in `keys`, returning how many were actually present.
    fn delete_many(&self, keys: &[String]) -> Result<usize>;

    /// List all keys starting with `prefix`.
    ///
    /// Administrative scan path only; not used during lookups.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Atomically add `delta` to the counter under `key`, creating it at
    /// `delta` when absent, and return the new value.
    ///
    /// Counters are stored as ASCII decimal so `get` can read them back.
    /// A delta of `0` reads the current value without changing it.
    fn increment(&self, key: &str, delta: u64) -> Result<u64>;

    /// Approximate stored size of `key` in bytes.
    ///
    /// Returns `Ok(None)` when the key is absent or the backend cannot
    /// answer. Reporting only; never used for correctness.
    fn memory_usage(&self, key: &str) -> Result<Option<u64>>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8], ttl_seconds: Option<u64>) -> Result<()> {
        (**self).set(key, value, ttl_seconds)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }

    fn delete_many(&self, keys: &[String]) -> Result<usize> {
        (**self).delete_many(keys)
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).list_keys(prefix)
    }

    fn increment(&self, key: &str, delta: u64) -> Result<u64> {
        (**self).increment(key, delta)
    }

    fn memory_usage(&self, key: &str) -> Result<Option<u64>> {
        (**self).memory_usage(key)
    }
}
