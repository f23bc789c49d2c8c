//! Integration tests for resilience module
//!
//! Exercises the limiter and backoff together the way the executor drives
//! them: two limiters acquired per attempt, backoff between attempts, all on
//! a shared mock clock.

#![cfg(feature = "runtime")]

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use graphgate_common::credential_digest;
use graphgate_common::resilience::{
    Backoff, Clock, MockClock, SlidingWindowRateLimiter, SystemClock,
};

/// Validates the tighter of the global and per-credential limits governs.
///
/// # Test Steps
/// 1. Global limit 4/min, per-credential limit 2/min
/// 2. Acquire both limiters three times for one credential
/// 3. Verify the third attempt waited one full window for the credential key
#[tokio::test]
async fn test_per_credential_limit_is_tighter_than_global() {
    let clock = Arc::new(MockClock::new());
    let global = SlidingWindowRateLimiter::with_clock(4, Duration::from_secs(60), Arc::clone(&clock));
    let per_credential =
        SlidingWindowRateLimiter::with_clock(2, Duration::from_secs(60), Arc::clone(&clock));
    let key = credential_digest("EAAB-one");

    for _ in 0..3 {
        global.acquire("global").await;
        per_credential.acquire(&key).await;
    }

    assert_eq!(clock.recorded_sleeps(), vec![Duration::from_secs(60)]);
    assert_eq!(per_credential.in_window(&key), 1);
    assert_eq!(global.in_window("global"), 0, "global events from before the wait aged out");
}

/// Validates that many tasks sharing one limiter never overshoot it.
#[tokio::test]
async fn test_shared_limiter_under_contention() {
    let clock = Arc::new(MockClock::new());
    let limiter =
        Arc::new(SlidingWindowRateLimiter::with_clock(3, Duration::from_secs(10), Arc::clone(&clock)));

    let admitted_at = join_all((0..9).map(|_| {
        let limiter = Arc::clone(&limiter);
        let clock = Arc::clone(&clock);
        async move {
            limiter.acquire("global").await;
            clock.now()
        }
    }))
    .await;

    let mut sorted = admitted_at;
    sorted.sort();
    for window in sorted.windows(4) {
        assert!(
            window[3].duration_since(window[0]) >= Duration::from_secs(10),
            "four admissions landed inside one window"
        );
    }
}

/// Validates a retry schedule's deterministic delays on a mock clock.
#[tokio::test]
async fn test_backoff_schedule_on_mock_clock() {
    let clock = MockClock::new();
    let backoff = Backoff::new(0.5, 2.0);

    for attempt in 0..4 {
        backoff.sleep(attempt, &clock).await;
    }

    let expected = [0.5, 1.0, 2.0, 2.0];
    for (slept, base) in clock.recorded_sleeps().iter().zip(expected) {
        assert!(slept.as_secs_f64() >= base);
        assert!(slept.as_secs_f64() <= base * 1.1 + 1e-9);
    }
}

/// Validates that abandoning a waiting acquire leaves the window intact.
///
/// # Test Steps
/// 1. Fill a 3/min limiter on the system clock
/// 2. Drop one waiting acquire via timeout and abort another spawned one
/// 3. Verify recorded admissions stay, nothing extra was recorded, and the
///    limiter still refuses
#[tokio::test]
async fn test_cancelled_acquire_keeps_recorded_admissions() {
    let limiter = Arc::new(SlidingWindowRateLimiter::with_clock(
        3,
        Duration::from_secs(60),
        Arc::new(SystemClock),
    ));
    for _ in 0..2 {
        limiter.acquire("cred").await;
    }
    limiter.acquire("cred").await;
    assert_eq!(limiter.in_window("cred"), 3);

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), limiter.acquire("cred")).await;
    assert!(timed_out.is_err(), "a full window must make the caller wait");

    let waiter = {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move { limiter.acquire("cred").await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    waiter.abort();
    assert!(waiter.await.unwrap_err().is_cancelled());

    assert_eq!(limiter.in_window("cred"), 3);
    assert!(limiter.try_acquire("cred").is_err());
}

/// Validates a cancelled backoff sleep does not disturb a later schedule.
#[tokio::test]
async fn test_cancelled_backoff_sleep_is_abandoned() {
    let backoff = Backoff::new(10.0, 30.0);

    let cancelled = tokio::time::timeout(Duration::from_millis(20), backoff.sleep(0, &SystemClock)).await;
    assert!(cancelled.is_err());

    let clock = MockClock::new();
    let slept = backoff.sleep(0, &clock).await;
    assert_eq!(clock.recorded_sleeps(), vec![slept]);
    assert!(slept >= Duration::from_secs(10));
}
