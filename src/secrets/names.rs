//! Well-known secret names.

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const SEARCH_API_KEY: &str = "SEARCH_API_KEY";
pub const SEARCH_ENGINE_ID: &str = "SEARCH_ENGINE_ID";
pub const YOUTUBE_API_KEY: &str = "YOUTUBE_API_KEY";

pub const ALL: &[&str] = &[GEMINI_API_KEY, SEARCH_API_KEY, SEARCH_ENGINE_ID, YOUTUBE_API_KEY];
