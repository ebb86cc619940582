//! Failure classification for generation attempts.

use serde::{Deserialize, Serialize};

/// Markers that identify a throttled or overloaded backend.
///
/// Matched case-insensitively anywhere in the error message.
pub const RATE_LIMIT_MARKERS: [&str; 5] = [
    "429",
    "503",
    "rate limit",
    "quota exceeded",
    "resource exhausted",
];

/// Why an attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Throttled; recorded in the day's rate-limit log.
    RateLimited,

    /// Anything else.
    OtherError,
}

/// Classify an error by its message text alone.
pub fn classify(message: &str) -> FailureKind {
    let lowered = message.to_lowercase();
    if RATE_LIMIT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
    {
        FailureKind::RateLimited
    } else {
        FailureKind::OtherError
    }
}
