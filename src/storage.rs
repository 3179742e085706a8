//! Client-side persistence
//!
//! The browser console keeps its bearer tokens in cookies and its store
//! snapshot in local storage. Both collapse here into one string key/value
//! store behind [`ClientStorage`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cookie holding the primary bearer token.
pub const SESSION_TOKEN_KEY: &str = "logibrisk";
/// Cookie holding the optional subscription bearer token.
pub const SUBSCRIPTION_TOKEN_KEY: &str = "subscriptionToken";
/// Local-storage entry holding the persisted store snapshot.
pub const PERSISTED_STATE_KEY: &str = "persist:fields";
/// Local-storage entry holding the cached user profile.
pub const CACHED_PROFILE_KEY: &str = "logiBriskUser";

/// Everything a 401 wipes.
pub const SESSION_KEYS: [&str; 4] = [
    SESSION_TOKEN_KEY,
    SUBSCRIPTION_TOKEN_KEY,
    PERSISTED_STATE_KEY,
    CACHED_PROFILE_KEY,
];

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Remove every entry.
    fn clear(&self) -> Result<(), StorageError> {
        for key in self.keys()? {
            self.remove(&key)?;
        }
        Ok(())
    }

    /// Remove the session-scoped entries (tokens, store snapshot, profile).
    fn clear_session(&self) -> Result<(), StorageError> {
        for key in SESSION_KEYS {
            self.remove(key)?;
        }
        Ok(())
    }
}

pub type SharedStorage = Arc<dyn ClientStorage>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Volatile storage, used by tests and hosts without a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(lock(&self.entries).keys().cloned().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        lock(&self.entries).clear();
        Ok(())
    }
}

/// JSON file backed storage; every mutation is written through.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened client storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Encode {
            key: self.path.display().to_string(),
            source,
        })?;
        std::fs::write(&self.path, text).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(lock(&self.entries).keys().cloned().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        entries.clear();
        self.flush(&entries)
    }
}
