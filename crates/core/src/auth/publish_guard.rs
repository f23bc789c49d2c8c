//! Sliding 24-hour cap on publish actions per subject
//!
//! This is a business rule, separate from transport throttling: it rejects
//! instead of waiting.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use graphgate_domain::constants::{PUBLISH_CAP, PUBLISH_WINDOW_SECS};
use graphgate_domain::{GatewayError, Result};
use parking_lot::Mutex;
use tracing::warn;

/// Subject count at which drained histories are first swept.
const PRUNE_THRESHOLD: usize = 1024;

type History = HashMap<String, VecDeque<DateTime<Utc>>>;

#[derive(Debug)]
pub struct PublishRateGuard {
    cap: usize,
    window: Duration,
    history: Mutex<(History, usize)>,
}

impl Default for PublishRateGuard {
    fn default() -> Self {
        Self::new(PUBLISH_CAP, Duration::seconds(PUBLISH_WINDOW_SECS))
    }
}

impl PublishRateGuard {
    pub fn new(cap: usize, window: Duration) -> Self {
        Self { cap, window, history: Mutex::new((HashMap::new(), PRUNE_THRESHOLD)) }
    }

    /// Records a publish for `subject_id` at `now`, or fails with
    /// `RATE_LIMIT` when the subject already used its cap inside the window.
    pub fn check_and_record(&self, subject_id: &str, now: DateTime<Utc>) -> Result<()> {
        let window_start = now - self.window;
        let mut guard = self.history.lock();
        let (history, prune_at) = &mut *guard;
        if history.len() >= *prune_at {
            prune_drained(history, window_start);
            *prune_at = (history.len() * 2).max(PRUNE_THRESHOLD);
        }
        let entries = history.entry(subject_id.to_string()).or_default();
        evict_before(entries, window_start);

        if entries.len() >= self.cap {
            warn!(subject_id, limit = self.cap, "publish cap reached");
            #[allow(clippy::cast_precision_loss)]
            let retry_after = self.window.num_seconds() as f64;
            return Err(GatewayError::rate_limit("Publish limit reached for the 24h window")
                .with_detail("subject_id", subject_id)
                .with_detail("limit", self.cap)
                .with_retry_after(retry_after));
        }

        entries.push_back(now);
        Ok(())
    }

    /// Publishes recorded for `subject_id` inside the window ending at `now`.
    pub fn recorded(&self, subject_id: &str, now: DateTime<Utc>) -> usize {
        let window_start = now - self.window;
        self.history
            .lock()
            .0
            .get(subject_id)
            .map_or(0, |entries| entries.iter().filter(|&&at| at >= window_start).count())
    }

    /// Subjects currently holding a history.
    pub fn tracked_subjects(&self) -> usize {
        self.history.lock().0.len()
    }
}

fn evict_before(entries: &mut VecDeque<DateTime<Utc>>, window_start: DateTime<Utc>) {
    while entries.front().is_some_and(|&at| at < window_start) {
        entries.pop_front();
    }
}

fn prune_drained(history: &mut History, window_start: DateTime<Utc>) {
    history.retain(|_, entries| {
        evict_before(entries, window_start);
        !entries.is_empty()
    });
}
