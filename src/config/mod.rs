//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BrokerConfig (validated, immutable)
//!     → read once by Broker::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the process is restarted to change it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::BrokerConfig;
pub use schema::CacheConfig;
pub use schema::EligibilityConfig;
pub use schema::ObservabilityConfig;
pub use schema::RetryConfig;
pub use schema::SecretSource;
pub use schema::SecretsConfig;
pub use schema::StoreKind;
pub use schema::UpstreamConfig;
