//! Crate-level error type for brokered calls.

use thiserror::Error;

use crate::resilience::classify::{Classify, ErrorClass};
use crate::secrets::SecretError;
use crate::upstream::ApiError;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error(transparent)]
    Upstream(#[from] ApiError),

    #[error(transparent)]
    Secret(#[from] SecretError),
}

impl Classify for BrokerError {
    fn classification(&self) -> ErrorClass {
        match self {
            BrokerError::Upstream(e) => e.classification(),
            BrokerError::Secret(SecretError::Unavailable { .. }) => ErrorClass::Network,
            BrokerError::Secret(SecretError::Io { source, .. }) => source.classification(),
            // No usable credential.
            BrokerError::Secret(_) => ErrorClass::Auth,
        }
    }
}
