//! Resilience primitives for the upstream executor
//!
//! - **Clock**: monotonic/wall time plus an injectable `sleep`, so every wait
//!   in the gateway can run against [`MockClock`] in tests
//! - **Sliding-window rate limiter**: per-key admission over a trailing window
//! - **Backoff**: capped exponential delay with a small random tail
//!
//! All waiting happens through [`Clock::sleep`]. Dropping the future that is
//! waiting abandons the wait without touching limiter state; admissions
//! already recorded stay recorded.

pub mod backoff;
pub mod clock;
pub mod rate_limiter;

pub use backoff::{Backoff, JITTER_RATIO, MAX_BACKOFF_EXPONENT, MAX_DELAY_SECS};
pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limiter::SlidingWindowRateLimiter;
