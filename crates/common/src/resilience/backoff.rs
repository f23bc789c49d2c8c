//! Exponential backoff with a bounded random tail

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use super::Clock;

/// Maximum exponent for exponential backoff calculation to prevent overflow
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Ceiling applied to both inputs, so the computed delay always fits a
/// `Duration`.
pub const MAX_DELAY_SECS: f64 = 86_400.0;

/// Upper bound of the random tail, as a fraction of the base delay.
pub const JITTER_RATIO: f64 = 0.1;

/// `min(max, 2^attempt * factor)` seconds plus up to 10% jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    factor_secs: f64,
    max_secs: f64,
}

impl Backoff {
    /// Negative or non-finite inputs are treated as zero; larger ones are
    /// capped at [`MAX_DELAY_SECS`].
    pub fn new(factor_secs: f64, max_secs: f64) -> Self {
        let sanitize = |v: f64| if v.is_finite() && v > 0.0 { v.min(MAX_DELAY_SECS) } else { 0.0 };
        Self { factor_secs: sanitize(factor_secs), max_secs: sanitize(max_secs) }
    }

    /// Deterministic component of the delay for `attempt` (zero-based).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.min(MAX_BACKOFF_EXPONENT)).unwrap_or(30);
        let secs = (2f64.powi(exponent) * self.factor_secs).min(self.max_secs);
        Duration::from_secs_f64(secs)
    }

    /// Delay with the jitter fraction supplied by the caller; `unit` is
    /// clamped to `[0, 1]`.
    pub fn delay_with_unit(&self, attempt: u32, unit: f64) -> Duration {
        let base = self.base_delay(attempt);
        base + base.mul_f64(unit.clamp(0.0, 1.0) * JITTER_RATIO)
    }

    /// Delay with a freshly drawn jitter fraction.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with_unit(attempt, rand::thread_rng().gen_range(0.0..1.0))
    }

    /// Sleep for [`Backoff::delay`] on `clock`, returning the delay used.
    pub async fn sleep<C: Clock + ?Sized>(&self, attempt: u32, clock: &C) -> Duration {
        let delay = self.delay(attempt);
        debug!(attempt, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "backing off");
        clock.sleep(delay).await;
        delay
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(0.5, 30.0)
    }
}
