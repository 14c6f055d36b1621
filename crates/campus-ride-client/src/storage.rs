//! Durable key/value storage backends.
//!
//! The token store keeps three entries (access token, refresh token, cached
//! profile) in whatever backend it is given. Writes are atomic per key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;

/// Storage error.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that cannot be used as a file name.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Durable string key/value storage.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Read a value; `Ok(None)` when absent.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove a value; removing an absent key succeeds.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Shared storage backend handle.
pub type SharedStorage = Arc<dyn StorageBackend>;

// ============================================================================
// FileStorage
// ============================================================================

/// File-based storage: one file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        // Write-then-rename so readers never observe a partial value. Each
        // write gets its own temp file so concurrent sets cannot collide.
        let tmp = self.dir.join(temp_name(key));
        let written = async {
            tokio::fs::write(&tmp, value).await?;
            tokio::fs::rename(&tmp, &path).await
        }
        .await;
        if let Err(source) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(source));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Hidden, per-write temp file name for `key`.
fn temp_name(key: &str) -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(".{}.tmp.{}.{}.{}", key, std::process::id(), nanos, seq)
}

// ============================================================================
// MemoryStorage
// ============================================================================

/// In-memory storage for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_storage_set_get_remove() {
        let temp = tempdir().unwrap();
        let storage = FileStorage::new(temp.path().join("data"));

        assert_eq!(storage.get("access_token").await.unwrap(), None);

        storage.set("access_token", "abc").await.unwrap();
        assert_eq!(
            storage.get("access_token").await.unwrap().as_deref(),
            Some("abc")
        );

        storage.set("access_token", "def").await.unwrap();
        assert_eq!(
            storage.get("access_token").await.unwrap().as_deref(),
            Some("def")
        );
        assert!(!temp.path().join("data").join("access_token.tmp").exists());

        storage.remove("access_token").await.unwrap();
        storage.remove("access_token").await.unwrap();
        assert_eq!(storage.get("access_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_concurrent_sets() {
        let temp = tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(temp.path()));

        let writes = (0..16).map(|i| {
            let storage = storage.clone();
            tokio::spawn(async move { storage.set("user_profile", &format!("v{}", i)).await })
        });
        for write in futures::future::join_all(writes).await {
            write.unwrap().unwrap();
        }

        let value = storage.get("user_profile").await.unwrap().unwrap();
        assert!(value.starts_with('v'));

        let mut entries = std::fs::read_dir(temp.path()).unwrap();
        let only = entries.next().unwrap().unwrap();
        assert_eq!(only.file_name(), "user_profile");
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_temp_names_are_unique() {
        let a = temp_name("access_token");
        let b = temp_name("access_token");
        assert_ne!(a, b);
        assert!(a.starts_with(".access_token.tmp."));
    }

    #[tokio::test]
    async fn test_file_storage_rejects_path_keys() {
        let temp = tempdir().unwrap();
        let storage = FileStorage::new(temp.path());

        let err = storage.set("../escape", "x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
        assert!(storage.get("").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set("refresh_token", "r1").await.unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(
            storage.get("refresh_token").await.unwrap().as_deref(),
            Some("r1")
        );

        storage.remove("refresh_token").await.unwrap();
        assert!(storage.is_empty());
    }
}
