//! Secret resolution.
//!
//! # Data Flow
//! ```text
//! SecretProvider::get(name)
//!     → cached and within TTL? return it
//!     → store.rs access (EnvSecretStore | DirSecretStore)
//!     → success: overwrite slot, return
//!     → failure: stale slot? return it : propagate error
//! ```
//!
//! # Design Decisions
//! - One provider for every name instead of one cache per secret
//! - Stale values outlive TTL indefinitely as an outage fallback
//! - Values never reach `Debug` output or log records

pub mod names;
pub mod provider;
pub mod store;

pub use provider::{SecretProvider, DEFAULT_SECRET_TTL};
pub use store::{DirSecretStore, EnvSecretStore, SecretError, SecretStore};
