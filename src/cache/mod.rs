//! Result cache subsystem.
//!
//! # Data Flow
//! ```text
//! ResultCache::get_or_fetch(key, ttl, fetch)
//!     → store.rs read (CacheStore: MemoryStore | FileStore)
//!     → fresh? return data
//!     → else fetch() → store.rs write { data, createdAt, expiresAt }
//! ```
//!
//! # Design Decisions
//! - Fail open: a store outage never blocks the upstream capability
//! - Expiry is logical; expired documents stay until overwritten
//! - Payloads are stored as JSON values and decoded per call site
//! - Single-flight is opt-in; the default is last-write-wins

pub mod entry;
pub mod file_store;
pub mod key;
pub mod result_cache;
pub mod store;

pub use entry::CacheEntry;
pub use file_store::FileStore;
pub use key::cache_key;
pub use result_cache::ResultCache;
pub use store::{CacheStore, MemoryStore, StoreError};
