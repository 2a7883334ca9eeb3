//! "Get cached value or compute and store".
//!
//! # Behavior
//! - Fresh document → returned, fetcher not called
//! - Missing or expired → fetcher called once, result stored with `now + ttl`
//! - Store read fails → fetcher called, result returned without caching
//! - Store write fails → logged, fresh result still returned
//!
//! # Concurrency
//! Without single-flight, concurrent misses on one key each call the fetcher
//! and the last write wins. That is only safe for idempotent fetchers.
//! With single-flight, misses on the same key queue on a per-key gate and
//! re-check the store before fetching.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::entry::CacheEntry;
use crate::cache::store::CacheStore;
use crate::observability::metrics;

enum Lookup<T> {
    Hit(T),
    Miss,
    StoreDown,
}

pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
    single_flight: bool,
    gates: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self {
            store,
            default_ttl,
            single_flight: false,
            gates: DashMap::new(),
        }
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// [`ResultCache::get_or_fetch`] with the configured default TTL.
    pub async fn get_or_fetch_default<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_fetch(key, self.default_ttl, fetch).await
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    ///
    /// Only errors from `fetch` are returned; store failures fail open.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.lookup(key).await {
            Lookup::Hit(value) => return Ok(value),
            Lookup::StoreDown => return fetch().await,
            Lookup::Miss => {}
        }

        if !self.single_flight {
            return self.fetch_and_store(key, ttl, fetch).await;
        }

        let gate = self.gates.entry(key.to_string()).or_default().value().clone();
        let result = {
            let _turn = gate.lock().await;
            match self.lookup(key).await {
                Lookup::Hit(value) => Ok(value),
                Lookup::StoreDown => fetch().await,
                Lookup::Miss => self.fetch_and_store(key, ttl, fetch).await,
            }
        };
        // Map plus our clone: nobody else is queued on this key.
        self.gates.remove_if(key, |_, g| Arc::strong_count(g) <= 2);
        result
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        let entry = match self.store.read(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                metrics::record_cache_lookup("miss");
                return Lookup::Miss;
            }
            Err(e) => {
                metrics::record_cache_lookup("store_error");
                tracing::warn!(key, error = %e, "Cache read failed, calling upstream directly");
                return Lookup::StoreDown;
            }
        };

        if !entry.is_fresh(Utc::now()) {
            metrics::record_cache_lookup("expired");
            tracing::debug!(key, expired_at = %entry.expires_at, "Cache entry expired");
            return Lookup::Miss;
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => {
                metrics::record_cache_lookup("hit");
                tracing::debug!(key, "Cache hit");
                Lookup::Hit(value)
            }
            Err(e) => {
                // Payload shape changed since it was written; refetch and overwrite.
                metrics::record_cache_lookup("store_error");
                tracing::warn!(key, error = %e, "Cached payload does not match expected type");
                Lookup::Miss
            }
        }
    }

    async fn fetch_and_store<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = fetch().await?;

        match serde_json::to_value(&value) {
            Ok(data) => {
                let entry = CacheEntry::new(key, data, Utc::now(), ttl);
                if let Err(e) = self.store.write(entry).await {
                    tracing::warn!(key, error = %e, "Cache write failed, returning uncached result");
                }
            }
            Err(e) => tracing::warn!(key, error = %e, "Result not serializable, skipping cache"),
        }

        Ok(value)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("default_ttl", &self.default_ttl)
            .field("single_flight", &self.single_flight)
            .finish()
    }
}
