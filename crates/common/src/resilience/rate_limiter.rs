//! Sliding-window rate limiting
//!
//! Each key keeps the instants of its admitted events inside the trailing
//! window. Admission is a recorded fact rather than a lease: nothing is
//! returned to the window when a caller later fails or is cancelled.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::{Clock, SystemClock};

/// Key count at which drained windows are first swept.
const PRUNE_THRESHOLD: usize = 1024;

/// Per-key sliding-window limiter.
///
/// A single mutex covers the whole evict/decide/record sequence, so two
/// callers can never both observe a free slot and both take it. The lock is
/// released before waiting. Waiters are not served in FIFO order: a caller
/// that arrives while another is sleeping may take the slot first.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use graphgate_common::resilience::SlidingWindowRateLimiter;
///
/// # async fn example() {
/// let limiter = SlidingWindowRateLimiter::new(90, Duration::from_secs(60));
/// limiter.acquire("global").await;
/// assert_eq!(limiter.in_window("global"), 1);
/// # }
/// ```
pub struct SlidingWindowRateLimiter<C: Clock + ?Sized = SystemClock> {
    capacity: usize,
    window: Duration,
    events: Mutex<Windows>,
    clock: Arc<C>,
}

/// Per-key windows plus the key count that triggers the next sweep.
struct Windows {
    by_key: HashMap<String, VecDeque<Instant>>,
    prune_at: usize,
}

impl SlidingWindowRateLimiter<SystemClock> {
    /// Create a limiter with the system clock
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self::with_clock(capacity, window, Arc::new(SystemClock))
    }
}

impl<C: Clock + ?Sized> SlidingWindowRateLimiter<C> {
    /// Create a limiter with a custom clock. A capacity of zero is raised to
    /// one so that every key can eventually make progress.
    pub fn with_clock(capacity: usize, window: Duration, clock: Arc<C>) -> Self {
        Self {
            capacity: capacity.max(1),
            window,
            events: Mutex::new(Windows { by_key: HashMap::new(), prune_at: PRUNE_THRESHOLD }),
            clock,
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Wait until one more event under `key` fits in the window, then record
    /// it.
    pub async fn acquire(&self, key: &str) {
        loop {
            match self.try_acquire(key) {
                Ok(()) => return,
                Err(wait) => {
                    debug!(
                        key,
                        capacity = self.capacity,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        "rate limiter saturated, waiting"
                    );
                    self.clock.sleep(wait).await;
                }
            }
        }
    }

    /// Record an event if the window has room.
    ///
    /// On refusal returns how long until the oldest retained event leaves the
    /// window.
    pub fn try_acquire(&self, key: &str) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut events = self.events.lock();
        if events.by_key.len() >= events.prune_at {
            prune_drained(&mut events.by_key, now, self.window);
            events.prune_at = (events.by_key.len() * 2).max(PRUNE_THRESHOLD);
        }
        let queue = events.by_key.entry(key.to_string()).or_default();
        evict_expired(queue, now, self.window);

        if queue.len() < self.capacity {
            queue.push_back(now);
            return Ok(());
        }

        let oldest = queue.front().copied().unwrap_or(now);
        Err(self.window.saturating_sub(now.saturating_duration_since(oldest)))
    }

    /// Events currently retained for `key`, after eviction.
    pub fn in_window(&self, key: &str) -> usize {
        let now = self.clock.now();
        let mut events = self.events.lock();
        let Some(queue) = events.by_key.get_mut(key) else {
            return 0;
        };
        evict_expired(queue, now, self.window);
        let len = queue.len();
        if len == 0 {
            events.by_key.remove(key);
        }
        len
    }

    /// Drop every key whose window has fully drained.
    pub fn prune(&self) {
        let now = self.clock.now();
        prune_drained(&mut self.events.lock().by_key, now, self.window);
    }

    /// Keys currently holding a window.
    pub fn tracked_keys(&self) -> usize {
        self.events.lock().by_key.len()
    }
}

fn prune_drained(by_key: &mut HashMap<String, VecDeque<Instant>>, now: Instant, window: Duration) {
    by_key.retain(|_, queue| {
        evict_expired(queue, now, window);
        !queue.is_empty()
    });
}

fn evict_expired(queue: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while queue.front().is_some_and(|&oldest| now.saturating_duration_since(oldest) >= window) {
        queue.pop_front();
    }
}

impl<C: Clock + ?Sized> std::fmt::Debug for SlidingWindowRateLimiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowRateLimiter")
            .field("capacity", &self.capacity)
            .field("window", &self.window)
            .field("keys", &self.events.lock().by_key.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::MockClock;

    fn limiter(capacity: usize, window_secs: u64) -> (SlidingWindowRateLimiter<MockClock>, MockClock) {
        let clock = MockClock::new();
        let limiter = SlidingWindowRateLimiter::with_clock(
            capacity,
            Duration::from_secs(window_secs),
            Arc::new(clock.clone()),
        );
        (limiter, clock)
    }

    /// Validates N acquisitions on a fresh key complete without waiting.
    #[tokio::test]
    async fn test_capacity_admits_without_delay() {
        let (limiter, clock) = limiter(3, 60);
        for _ in 0..3 {
            limiter.acquire("global").await;
        }
        assert!(clock.recorded_sleeps().is_empty());
        assert_eq!(limiter.in_window("global"), 3);
    }

    /// Validates the (N+1)th acquisition waits for the oldest event to age out.
    #[tokio::test]
    async fn test_overflow_waits_for_oldest_to_expire() {
        let (limiter, clock) = limiter(2, 60);
        limiter.acquire("k").await;
        clock.advance_secs(10);
        limiter.acquire("k").await;
        clock.advance_secs(5);

        limiter.acquire("k").await;

        assert_eq!(clock.recorded_sleeps(), vec![Duration::from_secs(45)]);
        assert_eq!(limiter.in_window("k"), 2);
    }

    /// Validates keys are isolated from each other.
    #[tokio::test]
    async fn test_keys_are_independent() {
        let (limiter, clock) = limiter(1, 60);
        limiter.acquire("a").await;
        limiter.acquire("b").await;
        assert!(clock.recorded_sleeps().is_empty());
        assert_eq!(limiter.try_acquire("a"), Err(Duration::from_secs(60)));
    }

    /// Validates an event exactly one window old is evicted.
    #[test]
    fn test_event_at_window_boundary_is_evicted() {
        let (limiter, clock) = limiter(1, 60);
        assert!(limiter.try_acquire("k").is_ok());
        clock.advance_secs(60);
        assert!(limiter.try_acquire("k").is_ok());
    }

    /// Validates drained windows are dropped instead of accumulating.
    #[test]
    fn test_drained_keys_are_pruned() {
        let (limiter, clock) = limiter(1, 60);
        for i in 0..PRUNE_THRESHOLD {
            assert!(limiter.try_acquire(&format!("cred-{i}")).is_ok());
        }
        assert_eq!(limiter.tracked_keys(), PRUNE_THRESHOLD);

        clock.advance_secs(60);
        assert!(limiter.try_acquire("fresh").is_ok());
        assert_eq!(limiter.tracked_keys(), 1);

        assert_eq!(limiter.in_window("cred-0"), 0);
        clock.advance_secs(60);
        assert_eq!(limiter.in_window("fresh"), 0);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    /// Validates an explicit prune keeps live windows.
    #[test]
    fn test_prune_keeps_live_windows() {
        let (limiter, clock) = limiter(2, 60);
        assert!(limiter.try_acquire("old").is_ok());
        clock.advance_secs(30);
        assert!(limiter.try_acquire("new").is_ok());
        clock.advance_secs(30);

        limiter.prune();

        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.in_window("new"), 1);
    }

    /// Validates zero capacity is treated as one.
    #[test]
    fn test_zero_capacity_is_clamped() {
        let (limiter, _clock) = limiter(0, 1);
        assert_eq!(limiter.capacity(), 1);
        assert!(limiter.try_acquire("k").is_ok());
        assert!(limiter.try_acquire("k").is_err());
    }

    /// Validates concurrent acquirers never exceed capacity within a window.
    #[tokio::test]
    async fn test_concurrent_acquirers_respect_capacity() {
        let clock = MockClock::new();
        let limiter = Arc::new(SlidingWindowRateLimiter::with_clock(
            5,
            Duration::from_secs(60),
            Arc::new(clock.clone()),
        ));

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire("shared").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(limiter.in_window("shared") <= 5);
        assert!(clock.elapsed() >= Duration::from_secs(120), "12 events at 5/min need two refills");
    }
}
