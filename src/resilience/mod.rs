//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call:
//!     → retries.rs (run attempt, classify failure, decide to retry)
//!     → classify.rs (NETWORK / RATE_LIMIT / AUTH / API / TIMEOUT / UNKNOWN)
//!     → backoff.rs (exponential delay with jitter, capped)
//!     → next attempt or surface the last error unchanged
//! ```
//!
//! # Design Decisions
//! - Default policy: one retry, 1s→5s backoff, factor 2, jitter on
//! - Classification is diagnostic; eligibility is a separate explicit policy
//! - Optional overall deadline stops retrying before the budget is blown
//! - Transport timeouts live in the HTTP client, not in the retry loop

pub mod backoff;
pub mod classify;
pub mod retries;

pub use backoff::Backoff;
pub use classify::{classify, Classify, ErrorClass};
pub use retries::{RetryEligibility, RetryPolicy, RetryingClient};
