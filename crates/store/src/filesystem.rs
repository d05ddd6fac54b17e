//! Filesystem store backend
//!
//! One file per key under a root directory. Values are written atomically
//! (temp file + rename) so concurrent writers of the same key settle on a
//! complete value, last writer wins. Expiry lives in a `.expiry` sidecar
//! holding epoch milliseconds; expired pairs are purged when touched.

use crate::{Error, KvStore, Result};
use chrono::Utc;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Filesystem-backed store for persistent single-host deployments
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

/// Map key characters that are unsafe in filenames.
///
/// Lossy but injective for the key shapes the cache produces (namespace
/// segments and hex digests joined by `:`). Keys returned by
/// [`FilesystemStore::list_keys`] are in this storage form; sanitizing is
/// idempotent, so they remain valid arguments to every other operation.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

const EXPIRY_SUFFIX: &str = ".expiry";
const TMP_SUFFIX: &str = ".tmp";

impl FilesystemStore {
    /// Create a store rooted at `root`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store at the resolved default root (see [`crate::root`]).
    ///
    /// # Errors
    ///
    /// Returns an error when no writable root directory can be found.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::root::default_root()?))
    }

    /// The root directory this store writes under
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn value_path(&self, sanitized: &str) -> PathBuf {
        self.root.join(sanitized)
    }

    fn expiry_path(&self, sanitized: &str) -> PathBuf {
        self.root.join(format!("{sanitized}{EXPIRY_SUFFIX}"))
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| Error::io(e, &self.root, "create_dir_all"))?;

        let tmp_path = path.with_extension("tmp");
        let mut file =
            fs::File::create(&tmp_path).map_err(|e| Error::io(e, &tmp_path, "create"))?;
        file.write_all(data)
            .map_err(|e| Error::io(e, &tmp_path, "write"))?;
        file.sync_all()
            .map_err(|e| Error::io(e, &tmp_path, "sync"))?;
        drop(file);

        fs::rename(&tmp_path, path).map_err(|e| Error::io(e, path, "rename"))?;
        Ok(())
    }

    /// Remove the key if its sidecar says it has expired. Returns whether the
    /// key was purged.
    fn purge_if_expired(&self, key: &str, sanitized: &str) -> Result<bool> {
        let expiry_path = self.expiry_path(sanitized);
        let raw = match fs::read_to_string(&expiry_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(Error::io(e, &expiry_path, "read")),
        };
        let expires_at_ms: i64 = raw
            .trim()
            .parse()
            .map_err(|_| Error::corrupt(key, "expiry sidecar is not epoch milliseconds"))?;

        if Utc::now().timestamp_millis() < expires_at_ms {
            return Ok(false);
        }
        self.remove_pair(sanitized)?;
        tracing::debug!(key, "Purged expired key");
        Ok(true)
    }

    fn remove_pair(&self, sanitized: &str) -> Result<()> {
        for path in [self.value_path(sanitized), self.expiry_path(sanitized)] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io(e, &path, "remove_file")),
            }
        }
        Ok(())
    }
}

impl KvStore for FilesystemStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let sanitized = sanitize_key(key);
        if self.purge_if_expired(key, &sanitized)? {
            return Ok(None);
        }
        let path = self.value_path(&sanitized);
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(e, &path, "read")),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl_seconds: Option<u64>) -> Result<()> {
        let sanitized = sanitize_key(key);
        self.write_atomic(&self.value_path(&sanitized), value)?;

        let expiry_path = self.expiry_path(&sanitized);
        if let Some(secs) = ttl_seconds {
            let expires_at_ms = Utc::now()
                .timestamp_millis()
                .saturating_add(i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX));
            self.write_atomic(&expiry_path, expires_at_ms.to_string().as_bytes())?;
        } else {
            match fs::remove_file(&expiry_path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::io(e, &expiry_path, "remove_file")),
            }
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.remove_pair(&sanitize_key(key))
    }

    fn delete_many(&self, keys: &[String]) -> Result<usize> {
        let mut removed = 0;
        for key in keys {
            let sanitized = sanitize_key(key);
            if self.value_path(&sanitized).exists() {
                removed += 1;
            }
            self.remove_pair(&sanitized)?;
        }
        Ok(removed)
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let sanitized_prefix = sanitize_key(prefix);
        let mut keys = Vec::new();

        for entry in
            fs::read_dir(&self.root).map_err(|e| Error::io(e, &self.root, "read_dir"))?
        {
            let entry = entry.map_err(|e| Error::io(e, &self.root, "read_dir_entry"))?;
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(EXPIRY_SUFFIX) || name.ends_with(TMP_SUFFIX) {
                continue;
            }
            if !name.starts_with(&sanitized_prefix) {
                continue;
            }
            if self.purge_if_expired(&name, &name)? {
                continue;
            }
            keys.push(name);
        }

        keys.sort_unstable();
        Ok(keys)
    }

    fn increment(&self, key: &str, delta: u64) -> Result<u64> {
        // Read-add-rewrite with atomic replace. Counters never carry a
        // sidecar, so expiry is untouched.
        let current = match self.get(key)? {
            Some(data) => std::str::from_utf8(&data)
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .ok_or_else(|| Error::corrupt(key, "counter is not ASCII decimal"))?,
            None => 0,
        };
        let next = current.saturating_add(delta);
        let sanitized = sanitize_key(key);
        self.write_atomic(&self.value_path(&sanitized), next.to_string().as_bytes())?;
        Ok(next)
    }

    fn memory_usage(&self, key: &str) -> Result<Option<u64>> {
        let sanitized = sanitize_key(key);
        if self.purge_if_expired(key, &sanitized)? {
            return Ok(None);
        }
        let path = self.value_path(&sanitized);
        match fs::metadata(&path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(e, &path, "metadata")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn force_expire(store: &FilesystemStore, key: &str) {
        let sanitized = sanitize_key(key);
        fs::write(store.expiry_path(&sanitized), b"0").unwrap();
    }

    #[test]
    fn set_then_get_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("ns:entry:abc", b"value", None).unwrap();
        assert_eq!(store.get("ns:entry:abc").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn get_absent_key() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn set_overwrites() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("k", b"one", None).unwrap();
        store.set("k", b"two", None).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn expired_key_is_absent_and_purged() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("k", b"value", Some(3600)).unwrap();
        force_expire(&store, "k");

        assert_eq!(store.get("k").unwrap(), None);
        assert!(!store.value_path(&sanitize_key("k")).exists());
        assert!(!store.expiry_path(&sanitize_key("k")).exists());
    }

    #[test]
    fn set_without_ttl_clears_old_sidecar() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("k", b"one", Some(3600)).unwrap();
        store.set("k", b"two", None).unwrap();
        assert!(!store.expiry_path(&sanitize_key("k")).exists());
    }

    #[test]
    fn corrupt_sidecar_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("k", b"value", Some(3600)).unwrap();
        fs::write(store.expiry_path(&sanitize_key("k")), b"not a number").unwrap();

        assert!(matches!(store.get("k"), Err(Error::Corrupt { .. })));
    }

    #[test]
    fn list_keys_matches_prefix_in_storage_form() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("ns:entry:aaa", b"1", None).unwrap();
        store.set("ns:entry:bbb", b"2", None).unwrap();
        store.set("ns:stats:hits", b"3", None).unwrap();

        let keys = store.list_keys("ns:entry:").unwrap();
        assert_eq!(keys, vec!["ns_entry_aaa", "ns_entry_bbb"]);

        // Storage-form keys remain valid arguments
        assert_eq!(store.get(&keys[0]).unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn list_keys_skips_expired_and_sidecars() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("ns:a", b"1", Some(3600)).unwrap();
        store.set("ns:b", b"2", Some(3600)).unwrap();
        force_expire(&store, "ns:a");

        assert_eq!(store.list_keys("ns:").unwrap(), vec!["ns_b"]);
    }

    #[test]
    fn delete_many_counts_present_keys() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("a", b"1", None).unwrap();
        store.set("b", b"2", None).unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(store.delete_many(&keys).unwrap(), 2);
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn increment_creates_and_adds() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        assert_eq!(store.increment("c", 1).unwrap(), 1);
        assert_eq!(store.increment("c", 2).unwrap(), 3);
        assert_eq!(store.get("c").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn memory_usage_reports_file_size() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemStore::new(tmp.path());

        store.set("k", b"12345", None).unwrap();
        assert_eq!(store.memory_usage("k").unwrap(), Some(5));
        assert_eq!(store.memory_usage("missing").unwrap(), None);
    }
}
