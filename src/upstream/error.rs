//! Upstream API errors.

use thiserror::Error;

use crate::resilience::classify::{classify, Classify, ErrorClass};

/// Body markers Google APIs use for quota and throttling rejections,
/// which can arrive as 403 as well as 429.
const RATE_LIMIT_SIGNALS: &[&str] = &[
    "RESOURCE_EXHAUSTED",
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "quotaExceeded",
    "dailyLimitExceeded",
];

const MAX_BODY_CHARS: usize = 2048;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {message}")]
    Network { message: String, code: Option<String> },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid upstream response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Non-2xx response; the body is kept (truncated) for diagnostics.
    pub fn status(status: u16, body: &str) -> Self {
        let body = if body.chars().count() > MAX_BODY_CHARS {
            let cut: String = body.chars().take(MAX_BODY_CHARS).collect();
            format!("{}…", cut)
        } else {
            body.to_string()
        };
        ApiError::Status { status, body }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the body carries a provider quota or throttling marker.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::Status { status, body } => {
                *status == 429 || RATE_LIMIT_SIGNALS.iter().any(|signal| body.contains(signal))
            }
            _ => false,
        }
    }
}

fn io_code(err: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            let code = match io.kind() {
                std::io::ErrorKind::ConnectionRefused => "ECONNREFUSED",
                std::io::ErrorKind::ConnectionReset => "ECONNRESET",
                std::io::ErrorKind::BrokenPipe => "EPIPE",
                std::io::ErrorKind::TimedOut => "ETIMEDOUT",
                _ => return None,
            };
            return Some(code.to_string());
        }
        source = current.source();
    }
    None
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ApiError::Timeout(err.to_string());
        }
        if err.is_decode() {
            return ApiError::Decode(err.to_string());
        }
        if err.is_builder() {
            return ApiError::InvalidRequest(err.to_string());
        }
        if let Some(status) = err.status() {
            return ApiError::status(status.as_u16(), &err.to_string());
        }
        let code = io_code(&err).or_else(|| err.is_connect().then(|| "ECONNREFUSED".to_string()));
        ApiError::Network {
            message: err.to_string(),
            code,
        }
    }
}

impl Classify for ApiError {
    fn classification(&self) -> ErrorClass {
        match self {
            ApiError::Network { message, code } => match classify(None, code.as_deref(), message) {
                ErrorClass::Unknown => ErrorClass::Network,
                class => class,
            },
            ApiError::Timeout(_) => ErrorClass::Timeout,
            ApiError::Status { .. } if self.is_rate_limited() => ErrorClass::RateLimit,
            ApiError::Status { status, body } => classify(Some(*status), None, body),
            ApiError::Decode(_) | ApiError::InvalidRequest(_) => ErrorClass::Api,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ApiError::status(429, "slow down").classification(), ErrorClass::RateLimit);
        assert_eq!(ApiError::status(401, "API key not valid").classification(), ErrorClass::Auth);
        assert_eq!(ApiError::status(400, "bad query").classification(), ErrorClass::Api);
        assert_eq!(ApiError::status(503, "backend unavailable").classification(), ErrorClass::Unknown);
        assert_eq!(ApiError::status(504, "deadline exceeded").classification(), ErrorClass::Timeout);
    }

    #[test]
    fn test_quota_signal_beats_forbidden() {
        let body = r#"{"error":{"code":403,"errors":[{"reason":"quotaExceeded"}]}}"#;
        let err = ApiError::status(403, body);
        assert!(err.is_rate_limited());
        assert_eq!(err.classification(), ErrorClass::RateLimit);

        let gemini = r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(ApiError::status(429, gemini).classification(), ErrorClass::RateLimit);
    }

    #[test]
    fn test_transport_classification() {
        let refused = ApiError::Network {
            message: "tcp connect error".into(),
            code: Some("ECONNREFUSED".into()),
        };
        assert_eq!(refused.classification(), ErrorClass::Network);

        let bare = ApiError::Network {
            message: "connection closed before message completed".into(),
            code: None,
        };
        assert_eq!(bare.classification(), ErrorClass::Network);
        assert_eq!(ApiError::Timeout("30s".into()).classification(), ErrorClass::Timeout);
        assert_eq!(ApiError::Decode("expected value".into()).classification(), ErrorClass::Api);
    }

    #[test]
    fn test_long_bodies_truncated() {
        let err = ApiError::status(500, &"x".repeat(10_000));
        match err {
            ApiError::Status { body, .. } => assert_eq!(body.chars().count(), MAX_BODY_CHARS + 1),
            other => panic!("unexpected {:?}", other),
        }
    }
}
