//! Read-time freshness policy for generated results.

use chrono::{DateTime, Duration, Utc};

/// Default staleness window: seven days.
pub const DEFAULT_STALENESS_DAYS: i64 = 7;

/// Decides whether a generated result is still fresh.
///
/// A result is fresh iff `now - generated_at < window`. Staleness never
/// deletes anything; it only tells the caller to regenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    window: Duration,
}

impl Freshness {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_fresh(&self, generated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(generated_at) < self.window
    }

    pub fn is_stale(&self, generated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        !self.is_fresh(generated_at, now)
    }
}

impl Default for Freshness {
    fn default() -> Self {
        Self::new(Duration::days(DEFAULT_STALENESS_DAYS))
    }
}
