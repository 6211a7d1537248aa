use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Per-cause rate limiter: at most one action per key within its window.
///
/// Keys are never evicted; the set of causes is small and fixed.
#[derive(Debug, Default)]
pub struct SuppressionWindow {
    last_fired: Mutex<HashMap<String, Instant>>,
}

impl SuppressionWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, key: &str, window: Duration) -> bool {
        self.allow_at(key, window, Instant::now())
    }

    /// Atomic check-and-set: records `now` only when the action is allowed.
    pub fn allow_at(&self, key: &str, window: Duration, now: Instant) -> bool {
        let mut last_fired = self.last_fired.lock();

        if let Some(previous) = last_fired.get(key) {
            if now.saturating_duration_since(*previous) < window {
                return false;
            }
        }

        last_fired.insert(key.to_string(), now);
        true
    }

    pub fn last_fired(&self, key: &str) -> Option<Instant> {
        self.last_fired.lock().get(key).copied()
    }
}
