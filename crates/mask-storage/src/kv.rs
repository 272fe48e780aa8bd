//! Durable string-keyed local state
//!
//! The vault persists everything local (key material, disclosure flags, the
//! ledger) as flat string key/value pairs, mirroring the browser-storage
//! substrate the product started on. Only single-key last-write-wins is
//! guaranteed here; cross-key invariants are the owning component's job,
//! enforced above this layer with a mutex.

use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mask_core::{VaultError, VaultResult};

/// A persistent map from string keys to string values.
pub trait StringStore: Send {
    fn get(&self, key: &str) -> VaultResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> VaultResult<()>;
    fn remove(&mut self, key: &str) -> VaultResult<()>;
    /// Administrative wipe; only the explicit reset flow calls this.
    fn clear(&mut self) -> VaultResult<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StringStore for MemoryStore {
    fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> VaultResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> VaultResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> VaultResult<()> {
        self.entries.clear();
        Ok(())
    }
}

/// JSON-file-backed store, flushed atomically via temp+rename on every
/// mutation. The map is tiny (a handful of keys), so rewriting the whole
/// file per set is the simple and correct choice.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl JsonFileStore {
    /// Load or create a store at the given path. A missing file starts
    /// empty; a present-but-unparseable file is surfaced as a state error
    /// rather than silently discarded, since it may hold the only copy of
    /// the vault key.
    pub fn open(path: &Path) -> VaultResult<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content).map_err(|e| {
                VaultError::State(format!("unreadable state file {}: {e}", path.display()))
            })?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn flush(&self) -> VaultResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating state dir: {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| VaultError::State(format!("serializing state: {e}")))?;

        // Atomic write: write to temp file, then rename
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &json)
            .with_context(|| format!("writing state temp: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("renaming state file: {}", self.path.display()))?;
        Ok(())
    }
}

impl StringStore for JsonFileStore {
    fn get(&self, key: &str) -> VaultResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> VaultResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> VaultResult<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> VaultResult<()> {
        self.entries.clear();
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));

        // last write wins
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store.set("maskStoreKey", "c2VjcmV0").unwrap();
            store.set("maskStoreKeyGenerated", "true").unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("maskStoreKey").unwrap().as_deref(), Some("c2VjcmV0"));
        assert_eq!(
            store.get("maskStoreKeyGenerated").unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn json_store_clear_wipes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.clear().unwrap();
        drop(store);

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn corrupt_state_file_is_a_state_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, VaultError::State(_)));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
