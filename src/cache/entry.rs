//! Cache documents.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Longest lifetime a document can get (100 years); longer TTLs are clamped.
pub const MAX_TTL_SECS: u64 = 36_500 * 24 * 60 * 60;

/// One cached result.
///
/// Persisted as `{ data, createdAt, expiresAt }` under its key. Expiry is
/// logical: stale documents stay in the store until overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Document id; not part of the stored body.
    #[serde(skip)]
    pub key: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, data: Value, now: DateTime<Utc>, ttl: Duration) -> Self {
        let ttl = ttl.min(Duration::from_secs(MAX_TTL_SECS));
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.into(),
            data,
            created_at: now,
            expires_at,
        }
    }

    /// Trusted only while `now < expires_at`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let entry = CacheEntry::new("k", json!(1), now, Duration::from_secs(60));
        assert!(entry.is_fresh(now));
        assert!(entry.is_fresh(now + chrono::Duration::seconds(59)));
        assert!(!entry.is_fresh(entry.expires_at));
        assert!(!entry.is_fresh(now + chrono::Duration::seconds(61)));
    }

    #[test]
    fn test_huge_ttl_clamped() {
        let now = Utc::now();
        let max = chrono::Duration::seconds(MAX_TTL_SECS as i64);
        for ttl in [Duration::from_secs(10_000_000_000_000), Duration::MAX] {
            let entry = CacheEntry::new("k", json!(1), now, ttl);
            assert_eq!(entry.expires_at - now, max);
            assert!(entry.is_fresh(now));
        }

        // Clamped expiry still survives the persisted document format.
        let doc = serde_json::to_string(&CacheEntry::new("k", json!(1), now, Duration::MAX)).unwrap();
        let back: CacheEntry = serde_json::from_str(&doc).unwrap();
        assert_eq!(back.expires_at - now, max);
    }

    #[test]
    fn test_document_layout_omits_key() {
        let now = Utc::now();
        let entry = CacheEntry::new("poems:sad", json!({"title": "t"}), now, Duration::from_secs(1));
        let doc = serde_json::to_value(&entry).unwrap();
        let mut fields: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        fields.sort();
        assert_eq!(fields, vec!["createdAt", "data", "expiresAt"]);
    }
}
