//! TTL-cached secret resolution with stale fallback.
//!
//! # Behavior
//! - Cached and younger than TTL → served without touching the store
//! - Otherwise refreshed from the store; success overwrites the slot
//! - Refresh failure with a cached value (any age) → stale value served
//! - Refresh failure with nothing cached → the store's error is returned
//!
//! Concurrent refreshes of one name may both hit the store; both write the
//! same value, so the race is benign.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::secrets::store::{SecretError, SecretStore};

pub const DEFAULT_SECRET_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
struct CachedSecret {
    value: String,
    fetched_at: Instant,
}

impl std::fmt::Debug for CachedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedSecret")
            .field("value", &"[REDACTED]")
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

pub struct SecretProvider {
    store: Arc<dyn SecretStore>,
    ttl: Duration,
    slots: DashMap<String, CachedSecret>,
    stale_served: AtomicU64,
}

impl SecretProvider {
    pub fn new(store: Arc<dyn SecretStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            slots: DashMap::new(),
            stale_served: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve `name`, preferring the cache while it is within TTL.
    pub async fn get(&self, name: &str) -> Result<String, SecretError> {
        let cached = self.slots.get(name).map(|slot| slot.value().clone());

        if let Some(slot) = &cached {
            if slot.fetched_at.elapsed() < self.ttl {
                metrics::record_secret_fetch("hit");
                return Ok(slot.value.clone());
            }
        }

        match self.store.access(name).await {
            Ok(value) => {
                self.slots.insert(
                    name.to_string(),
                    CachedSecret {
                        value: value.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                metrics::record_secret_fetch("refreshed");
                tracing::debug!(secret = name, "Secret refreshed");
                Ok(value)
            }
            Err(e) => match cached {
                Some(slot) => {
                    self.stale_served.fetch_add(1, Ordering::Relaxed);
                    metrics::record_secret_fetch("stale");
                    tracing::warn!(
                        secret = name,
                        age_secs = slot.fetched_at.elapsed().as_secs(),
                        error = %e,
                        "Secret refresh failed, serving cached value"
                    );
                    Ok(slot.value)
                }
                None => {
                    metrics::record_secret_fetch("failed");
                    tracing::error!(secret = name, error = %e, "Secret unavailable and nothing cached");
                    Err(e)
                }
            },
        }
    }

    /// Drop the cached value for `name`; the next `get` refreshes.
    pub fn invalidate(&self, name: &str) {
        self.slots.remove(name);
    }

    pub fn clear(&self) {
        self.slots.clear();
    }

    /// How many times a stale value was served after a failed refresh.
    pub fn stale_fallbacks(&self) -> u64 {
        self.stale_served.load(Ordering::Relaxed)
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}

impl std::fmt::Debug for SecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.slots.iter().map(|r| r.key().clone()).collect();
        f.debug_struct("SecretProvider")
            .field("ttl", &self.ttl)
            .field("cached", &names)
            .finish()
    }
}
