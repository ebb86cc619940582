//! Parsing of free-text model responses.
//!
//! Models are asked for a fixed layout but are not trusted to follow it;
//! both parsers accept whatever comes back and never fail.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upper bound on insights kept from one response.
pub const MAX_INSIGHTS: usize = 4;

/// Summary used when a response has no usable text at all.
pub const SUMMARY_UNAVAILABLE: &str = "Unable to generate summary.";

const BULLET_MARKERS: [char; 3] = ['-', '*', '•'];
const SUMMARY_PREFIX: &str = "SUMMARY:";
const TAKEAWAY_PREFIX: &str = "TAKEAWAY:";

lazy_static! {
    static ref NUMBERED_LINE: Regex = Regex::new(r"^\d+\.").unwrap();
}

/// Split an insights response into at most [`MAX_INSIGHTS`] plain lines.
///
/// Blank lines, bullet lines and `1.`-style numbered lines are dropped
/// rather than cleaned up.
pub fn parse_insights(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with(BULLET_MARKERS))
        .filter(|line| !NUMBERED_LINE.is_match(line))
        .take(MAX_INSIGHTS)
        .map(str::to_string)
        .collect()
}

/// Summary text plus key takeaways for one application's notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub summary: String,
    pub takeaways: Vec<String>,
}

/// Parse a `SUMMARY:` / `TAKEAWAY:` response.
///
/// A later `SUMMARY:` line replaces an earlier one. Without a usable
/// `SUMMARY:` line the first non-empty line stands in as the summary.
pub fn parse_summary(raw: &str) -> NoteSummary {
    let mut summary = String::new();
    let mut takeaways = Vec::new();

    for line in raw.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(SUMMARY_PREFIX) {
            summary = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(TAKEAWAY_PREFIX) {
            takeaways.push(rest.trim().to_string());
        }
    }

    if summary.is_empty() {
        summary = raw
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or(SUMMARY_UNAVAILABLE)
            .to_string();
    }

    NoteSummary { summary, takeaways }
}
