//! Resilient invocation layer for GenAI and search upstreams.
//!
//! # Architecture Overview
//!
//! ```text
//!     handler ──▶ Broker::cached_call(function, request, key, ttl, op)
//!                   │
//!                   ▼
//!            ┌───────────────┐  request id, cold start, memory,
//!            │ observability │  start/end/performance records
//!            └──────┬────────┘
//!                   ▼
//!            ┌───────────────┐  hit → return cached payload
//!            │     cache     │  miss/expired → fetch and store
//!            └──────┬────────┘  store down → fetch, fail open
//!                   ▼
//!            ┌───────────────┐  classify, back off with jitter,
//!            │  resilience   │  retry per policy, rethrow last error
//!            └──────┬────────┘
//!                   ▼
//!            ┌───────────────┐       ┌───────────────┐
//!            │   upstream    │──────▶│    secrets    │ TTL cache,
//!            │ Gemini/Search │       │               │ stale fallback
//!            └───────────────┘       └───────────────┘
//! ```

// Core subsystems
pub mod broker;
pub mod cache;
pub mod config;
pub mod error;
pub mod secrets;
pub mod upstream;

// Cross-cutting concerns
pub mod observability;
pub mod resilience;

pub use broker::Broker;
pub use config::schema::BrokerConfig;
pub use error::BrokerError;
pub use observability::{Instrumentation, RequestContext};
