//! Retry logic.
//!
//! # Responsibilities
//! - Run one upstream operation with a bounded number of retries
//! - Sleep with exponential backoff + jitter between attempts
//! - Classify each failure for logs and metrics
//! - Stop early when the overall deadline would be exceeded
//!
//! # Design Decisions
//! - The final error is returned exactly as the operation produced it
//! - Eligibility is an explicit policy; the default retries every class
//! - Randomness is injected so tests can seed it

use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::time::Instant;

use crate::config::{EligibilityConfig, RetryConfig};
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;
use crate::resilience::classify::{Classify, ErrorClass};

/// Which failures may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryEligibility {
    /// Every failure is retried while budget remains.
    #[default]
    Always,
    /// Auth failures and other 4xx responses fail immediately.
    SkipClientErrors,
}

impl RetryEligibility {
    pub fn is_retryable(self, class: ErrorClass) -> bool {
        match self {
            RetryEligibility::Always => true,
            RetryEligibility::SkipClientErrors => {
                !matches!(class, ErrorClass::Auth | ErrorClass::Api)
            }
        }
    }
}

impl From<EligibilityConfig> for RetryEligibility {
    fn from(config: EligibilityConfig) -> Self {
        match config {
            EligibilityConfig::Always => RetryEligibility::Always,
            EligibilityConfig::SkipClientErrors => RetryEligibility::SkipClientErrors,
        }
    }
}

/// Retry policy for one call site.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub retries: u32,
    pub backoff: Backoff,
    /// Overall budget for attempts plus sleeps.
    pub deadline: Option<Duration>,
    pub eligibility: RetryEligibility,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            backoff: Backoff::default(),
            deadline: None,
            eligibility: RetryEligibility::Always,
        }
    }
}

impl RetryPolicy {
    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            retries: config.retries,
            backoff: Backoff {
                min: Duration::from_millis(config.min_timeout_ms),
                max: Duration::from_millis(config.max_timeout_ms),
                factor: config.factor,
                jitter: config.jitter,
            },
            deadline: config.deadline_ms.map(Duration::from_millis),
            eligibility: config.eligibility.into(),
        }
    }
}

/// Runs upstream operations under a [`RetryPolicy`].
pub struct RetryingClient {
    policy: RetryPolicy,
    rng: Mutex<StdRng>,
}

impl RetryingClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic jitter for tests.
    pub fn with_seed(policy: RetryPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn next_delay(&self, retry: u32) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.policy.backoff.delay(retry, &mut *rng)
    }

    /// Call `operation` until it succeeds or the policy gives up.
    pub async fn call<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(
                            operation = operation_name,
                            attempts = attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Upstream call succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let class = err.classification();
            metrics::record_failed_attempt(operation_name, class);

            let retryable = self.policy.eligibility.is_retryable(class);
            if attempt >= max_attempts || !retryable {
                tracing::error!(
                    operation = operation_name,
                    attempts = attempt,
                    class = %class,
                    retryable,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "Upstream call failed"
                );
                return Err(err);
            }

            let delay = self.next_delay(attempt - 1);
            if let Some(deadline) = self.policy.deadline {
                if started.elapsed() + delay > deadline {
                    tracing::error!(
                        operation = operation_name,
                        attempts = attempt,
                        class = %class,
                        deadline_ms = deadline.as_millis() as u64,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %err,
                        "Retry deadline exceeded"
                    );
                    return Err(err);
                }
            }

            tracing::warn!(
                operation = operation_name,
                attempt,
                class = %class,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Upstream call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
