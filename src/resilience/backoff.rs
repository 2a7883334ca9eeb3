//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Shape of the backoff curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub min: Duration,
    /// Cap on any single delay.
    pub max: Duration,
    /// Growth per retry.
    pub factor: f64,
    /// Multiply each delay by a random value in [1, 2).
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(1000),
            max: Duration::from_millis(5000),
            factor: 2.0,
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (0 for the first retry).
    pub fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let mut delay_ms = self.min.as_millis() as f64 * self.factor.powi(exponent);

        if self.jitter {
            delay_ms *= rng.gen_range(1.0..2.0);
        }

        let capped = delay_ms.min(self.max.as_millis() as f64);
        if capped.is_finite() && capped > 0.0 {
            Duration::from_millis(capped.round() as u64)
        } else {
            Duration::ZERO
        }
    }
}
