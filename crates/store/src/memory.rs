//! In-memory store backend
//!
//! Backs tests and local development. Semantics mirror a hosted cache
//! service: atomic overwrite on `set`, last writer wins, and native expiry
//! (expired keys are purged when touched).

use crate::{Error, KvStore, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Mutex-protected map with per-key expiry
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys
    pub fn len(&self) -> usize {
        let now = Utc::now();
        self.lock().values().filter(|v| !v.is_expired(now)).count()
    }

    /// Whether the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredValue>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still a valid snapshot.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn expiry_from_ttl(now: DateTime<Utc>, ttl_seconds: Option<u64>) -> Result<Option<DateTime<Utc>>> {
    let Some(secs) = ttl_seconds else {
        return Ok(None);
    };
    let delta = i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| Error::configuration(format!("ttl of {secs}s is out of range")))?;
    now.checked_add_signed(delta)
        .map(Some)
        .ok_or_else(|| Error::configuration(format!("ttl of {secs}s overflows the clock")))
}

fn parse_counter(key: &str, data: &[u8]) -> Result<u64> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| Error::corrupt(key, "counter is not ASCII decimal"))
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Utc::now();
        let mut entries = self.lock();
        if entries.get(key).is_some_and(|v| v.is_expired(now)) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|v| v.data.clone()))
    }

    fn set(&self, key: &str, value: &[u8], ttl_seconds: Option<u64>) -> Result<()> {
        let expires_at = expiry_from_ttl(Utc::now(), ttl_seconds)?;
        self.lock().insert(
            key.to_string(),
            StoredValue {
                data: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn delete_many(&self, keys: &[String]) -> Result<usize> {
        let mut entries = self.lock();
        Ok(keys.iter().filter(|k| entries.remove(*k).is_some()).count())
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let now = Utc::now();
        let mut entries = self.lock();
        entries.retain(|_, v| !v.is_expired(now));
        let mut keys: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    fn increment(&self, key: &str, delta: u64) -> Result<u64> {
        let now = Utc::now();
        let mut entries = self.lock();
        if entries.get(key).is_some_and(|v| v.is_expired(now)) {
            entries.remove(key);
        }
        let current = match entries.get(key) {
            Some(value) => parse_counter(key, &value.data)?,
            None => 0,
        };
        let next = current.saturating_add(delta);
        let expires_at = entries.get(key).and_then(|v| v.expires_at);
        entries.insert(
            key.to_string(),
            StoredValue {
                data: next.to_string().into_bytes(),
                expires_at,
            },
        );
        Ok(next)
    }

    fn memory_usage(&self, key: &str) -> Result<Option<u64>> {
        let now = Utc::now();
        let entries = self.lock();
        Ok(entries
            .get(key)
            .filter(|v| !v.is_expired(now))
            .map(|v| v.data.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn force_expire(store: &MemoryStore, key: &str) {
        let mut entries = store.lock();
        if let Some(value) = entries.get_mut(key) {
            value.expires_at = Some(Utc::now() - TimeDelta::seconds(1));
        }
    }

    #[test]
    fn set_then_get_roundtrip() {
        let store = MemoryStore::new();
        store.set("k", b"value", None).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn get_absent_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn set_overwrites() {
        let store = MemoryStore::new();
        store.set("k", b"one", None).unwrap();
        store.set("k", b"two", None).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn expired_key_is_absent_and_purged() {
        let store = MemoryStore::new();
        store.set("k", b"value", Some(3600)).unwrap();
        force_expire(&store, "k");

        assert_eq!(store.get("k").unwrap(), None);
        assert!(store.lock().get("k").is_none());
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let store = MemoryStore::new();
        store.set("k", b"value", Some(0)).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set("k", b"value", None).unwrap();
        store.delete("k").unwrap();
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn delete_many_counts_present_keys() {
        let store = MemoryStore::new();
        store.set("a", b"1", None).unwrap();
        store.set("b", b"2", None).unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(store.delete_many(&keys).unwrap(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn list_keys_filters_by_prefix() {
        let store = MemoryStore::new();
        store.set("ns:entry:a", b"1", None).unwrap();
        store.set("ns:entry:b", b"2", None).unwrap();
        store.set("ns:stats:hits", b"3", None).unwrap();

        let keys = store.list_keys("ns:entry:").unwrap();
        assert_eq!(keys, vec!["ns:entry:a", "ns:entry:b"]);
    }

    #[test]
    fn list_keys_skips_expired() {
        let store = MemoryStore::new();
        store.set("ns:a", b"1", Some(3600)).unwrap();
        store.set("ns:b", b"2", None).unwrap();
        force_expire(&store, "ns:a");

        assert_eq!(store.list_keys("ns:").unwrap(), vec!["ns:b"]);
    }

    #[test]
    fn increment_creates_and_adds() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("c", 1).unwrap(), 1);
        assert_eq!(store.increment("c", 2).unwrap(), 3);
        assert_eq!(store.get("c").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn increment_zero_reads_current_value() {
        let store = MemoryStore::new();
        store.increment("c", 5).unwrap();
        assert_eq!(store.increment("c", 0).unwrap(), 5);
    }

    #[test]
    fn increment_rejects_non_numeric_value() {
        let store = MemoryStore::new();
        store.set("c", b"not a number", None).unwrap();
        assert!(matches!(
            store.increment("c", 1),
            Err(Error::Corrupt { .. })
        ));
    }

    #[test]
    fn memory_usage_reports_value_size() {
        let store = MemoryStore::new();
        store.set("k", b"12345", None).unwrap();
        assert_eq!(store.memory_usage("k").unwrap(), Some(5));
        assert_eq!(store.memory_usage("missing").unwrap(), None);
    }
}
