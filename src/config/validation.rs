//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTLs within (0, 100 years], backoff bounds ordered)
//! - Check that the selected stores have what they need (paths, directories)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BrokerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::cache::entry::MAX_TTL_SECS;
use crate::config::schema::{BrokerConfig, SecretSource, StoreKind};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BrokerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.cache.default_ttl_secs == 0 {
        errors.push(ValidationError::new("cache.default_ttl_secs", "must be greater than 0"));
    } else if config.cache.default_ttl_secs > MAX_TTL_SECS {
        errors.push(ValidationError::new(
            "cache.default_ttl_secs",
            format!("must not exceed {} (100 years)", MAX_TTL_SECS),
        ));
    }
    if config.cache.store == StoreKind::File
        && config.cache.file_path.as_deref().map_or(true, |p| p.trim().is_empty())
    {
        errors.push(ValidationError::new("cache.file_path", "required when store = \"file\""));
    }

    if config.secrets.ttl_secs == 0 {
        errors.push(ValidationError::new("secrets.ttl_secs", "must be greater than 0"));
    } else if config.secrets.ttl_secs > MAX_TTL_SECS {
        errors.push(ValidationError::new(
            "secrets.ttl_secs",
            format!("must not exceed {} (100 years)", MAX_TTL_SECS),
        ));
    }
    if config.secrets.source == SecretSource::Dir
        && config.secrets.dir.as_deref().map_or(true, |d| d.trim().is_empty())
    {
        errors.push(ValidationError::new("secrets.dir", "required when source = \"dir\""));
    }

    let retries = &config.retries;
    if retries.min_timeout_ms > retries.max_timeout_ms {
        errors.push(ValidationError::new(
            "retries.min_timeout_ms",
            format!(
                "{} exceeds max_timeout_ms {}",
                retries.min_timeout_ms, retries.max_timeout_ms
            ),
        ));
    }
    if !retries.factor.is_finite() || retries.factor < 1.0 {
        errors.push(ValidationError::new("retries.factor", "must be a finite number >= 1"));
    }
    if retries.deadline_ms == Some(0) {
        errors.push(ValidationError::new("retries.deadline_ms", "must be greater than 0 when set"));
    }

    let upstream = &config.upstream;
    if upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.request_timeout_secs", "must be greater than 0"));
    }
    for (field, value) in [
        ("upstream.gemini_base_url", &upstream.gemini_base_url),
        ("upstream.custom_search_url", &upstream.custom_search_url),
        ("upstream.youtube_base_url", &upstream.youtube_base_url),
    ] {
        if let Err(e) = url::Url::parse(value) {
            errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BrokerConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = BrokerConfig::default();
        config.cache.default_ttl_secs = 0;
        config.cache.store = StoreKind::File;
        config.secrets.source = SecretSource::Dir;
        config.retries.min_timeout_ms = 10_000;
        config.retries.factor = 0.5;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "cache.default_ttl_secs",
                "cache.file_path",
                "secrets.dir",
                "retries.min_timeout_ms",
                "retries.factor",
            ]
        );
    }

    #[test]
    fn test_ttl_upper_bound() {
        let mut config: BrokerConfig = toml::from_str("[cache]\ndefault_ttl_secs = 10000000000000\n").unwrap();
        config.secrets.ttl_secs = MAX_TTL_SECS + 1;
        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["cache.default_ttl_secs", "secrets.ttl_secs"]);

        config.cache.default_ttl_secs = MAX_TTL_SECS;
        config.secrets.ttl_secs = MAX_TTL_SECS;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = BrokerConfig::default();
        config.observability.metrics_address = "not-an-address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
