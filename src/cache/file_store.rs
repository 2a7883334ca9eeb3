//! Cache store persisted to a JSON file.
//!
//! The whole document map is rewritten on every write, which suits the small
//! number of distinct search keys a single deployment sees.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::cache::entry::CacheEntry;
use crate::cache::store::{CacheStore, StoreError};

pub struct FileStore {
    path: PathBuf,
    documents: DashMap<String, CacheEntry>,
    /// Serializes file rewrites.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store, loading existing documents if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let documents = DashMap::new();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if !content.trim().is_empty() {
                let map: HashMap<String, CacheEntry> = serde_json::from_str(&content)?;
                for (key, mut entry) in map {
                    entry.key = key.clone();
                    documents.insert(key, entry);
                }
            }
            tracing::info!(path = %path.display(), documents = documents.len(), "Loaded cache documents");
        }

        Ok(Self {
            path,
            documents,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let map: HashMap<String, CacheEntry> = self
            .documents
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        let body = serde_json::to_vec(&map)?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), documents = map.len(), "Saved cache documents");
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.documents.get(key).map(|r| r.value().clone()))
    }

    async fn write(&self, entry: CacheEntry) -> Result<(), StoreError> {
        self.documents.insert(entry.key.clone(), entry);
        self.persist().await
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("documents", &self.documents.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(store.is_empty());
        let entry = CacheEntry::new("videos:calm", json!(["a", "b"]), Utc::now(), Duration::from_secs(60));
        store.write(entry.clone()).await.unwrap();

        // Load new instance
        let loaded = FileStore::open(&path).unwrap();
        let read = loaded.read("videos:calm").await.unwrap().unwrap();
        assert_eq!(read.key, "videos:calm");
        assert_eq!(read.data, json!(["a", "b"]));
        assert_eq!(read.expires_at, entry.expires_at);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_unwritable_path_fails_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("cache.json");
        let store = FileStore::open(&path).unwrap();
        let entry = CacheEntry::new("k", json!(1), Utc::now(), Duration::from_secs(60));
        assert!(matches!(store.write(entry).await, Err(StoreError::Io(_))));
    }
}
