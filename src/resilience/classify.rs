//! Error classification for diagnostics and retry eligibility.
//!
//! Classification never changes the error a caller receives. It only labels
//! log records and metrics, and feeds `RetryEligibility::is_retryable`.

use std::fmt;

use serde::Serialize;

/// Coarse failure category of an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorClass {
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    #[serde(rename = "API_ERROR")]
    Api,
    #[serde(rename = "RATE_LIMIT_ERROR")]
    RateLimit,
    #[serde(rename = "AUTH_ERROR")]
    Auth,
    #[serde(rename = "TIMEOUT_ERROR")]
    Timeout,
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Network => "NETWORK_ERROR",
            ErrorClass::Api => "API_ERROR",
            ErrorClass::RateLimit => "RATE_LIMIT_ERROR",
            ErrorClass::Auth => "AUTH_ERROR",
            ErrorClass::Timeout => "TIMEOUT_ERROR",
            ErrorClass::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Socket-level error codes that indicate connectivity trouble.
const NETWORK_CODES: &[&str] = &[
    "ECONNREFUSED",
    "ECONNRESET",
    "ENOTFOUND",
    "ETIMEDOUT",
    "EAI_AGAIN",
    "EHOSTUNREACH",
    "ENETUNREACH",
    "EPIPE",
];

/// Classify from the raw facts an error exposes.
///
/// Precedence: network code, rate limit, auth, other 4xx, timeout, unknown.
pub fn classify(status: Option<u16>, code: Option<&str>, message: &str) -> ErrorClass {
    if let Some(code) = code {
        if NETWORK_CODES.iter().any(|c| code.eq_ignore_ascii_case(c)) {
            return ErrorClass::Network;
        }
    }

    let lowered = message.to_ascii_lowercase();
    if status == Some(429) || lowered.contains("rate limit") {
        return ErrorClass::RateLimit;
    }

    match status {
        Some(401) | Some(403) => return ErrorClass::Auth,
        Some(s) if (400..500).contains(&s) => return ErrorClass::Api,
        _ => {}
    }

    if lowered.contains("timeout") || lowered.contains("timed out") || lowered.contains("deadline") {
        return ErrorClass::Timeout;
    }

    ErrorClass::Unknown
}

/// Errors that can report their own classification.
pub trait Classify {
    fn classification(&self) -> ErrorClass;
}

impl Classify for reqwest::Error {
    fn classification(&self) -> ErrorClass {
        if self.is_timeout() {
            return ErrorClass::Timeout;
        }
        if self.is_connect() {
            return ErrorClass::Network;
        }
        classify(self.status().map(|s| s.as_u16()), None, &self.to_string())
    }
}

impl Classify for std::io::Error {
    fn classification(&self) -> ErrorClass {
        use std::io::ErrorKind;
        match self.kind() {
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe => ErrorClass::Network,
            ErrorKind::TimedOut => ErrorClass::Timeout,
            _ => classify(None, None, &self.to_string()),
        }
    }
}
