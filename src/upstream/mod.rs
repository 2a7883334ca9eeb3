//! Upstream API access.
//!
//! # Data Flow
//! ```text
//! Upstreams::{gemini_generate, custom_search, youtube_search}
//!     → SecretProvider (API key, engine id)
//!     → client.rs (reqwest, request/connect timeouts)
//!     → error.rs (status, transport, decode → ApiError, classified)
//! ```

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::ApiClient;
pub use endpoints::{SearchItem, Upstreams, VideoItem, MAX_VIDEO_RESULTS};
pub use error::ApiError;
