//! Persistent key/value store behind the result cache.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::entry::CacheEntry;

/// Failures of the backing store. The result cache never surfaces these.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store unreachable or refused the operation.
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("cache store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded or decoded.
    #[error("cache document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Single-document reads and writes; overlapping writers are last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Overwrite the document stored under `entry.key`.
    async fn write(&self, entry: CacheEntry) -> Result<(), StoreError>;
}

/// Process-local store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Documents, expired ones included.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    pub fn insert(&self, entry: CacheEntry) {
        self.inner.insert(entry.key.clone(), entry);
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.get(key))
    }

    async fn write(&self, entry: CacheEntry) -> Result<(), StoreError> {
        self.insert(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        assert!(store.read("k").await.unwrap().is_none());

        let now = Utc::now();
        store.write(CacheEntry::new("k", json!(1), now, Duration::from_secs(5))).await.unwrap();
        store.write(CacheEntry::new("k", json!(2), now, Duration::from_secs(5))).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.read("k").await.unwrap().unwrap().data, json!(2));
    }
}
