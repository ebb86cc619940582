//! Diagnostic channel for failures that must not affect control flow.
//!
//! Rate-limit bookkeeping and cache persistence report here instead of
//! returning errors. The sink never feeds back into the caller.

use parking_lot::Mutex;
use std::fmt;

/// Which side effect failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Writing the day's rate-limit record
    RateLimitLog,
    /// Reading a cached result
    CacheRead,
    /// Persisting a freshly generated result
    CacheWrite,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::RateLimitLog => write!(f, "rate_limit_log"),
            DiagnosticKind::CacheRead => write!(f, "cache_read"),
            DiagnosticKind::CacheWrite => write!(f, "cache_write"),
        }
    }
}

/// A swallowed failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Document path or model identifier involved
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Fire-and-forget receiver for swallowed failures.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that writes to `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::error!(
            kind = %diagnostic.kind,
            subject = %diagnostic.subject,
            error = %diagnostic.message,
            "Background write failed"
        );
    }
}

/// Sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.lock().iter().filter(|d| d.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_counts_by_kind() {
        let sink = RecordingSink::new();
        assert!(sink.is_empty());

        sink.report(Diagnostic::new(DiagnosticKind::CacheWrite, "users/u/insights/latest", "disk full"));
        sink.report(Diagnostic::new(DiagnosticKind::RateLimitLog, "gemini-2.5-pro", "denied"));

        assert_eq!(sink.count(DiagnosticKind::CacheWrite), 1);
        assert_eq!(sink.count(DiagnosticKind::CacheRead), 0);
        assert_eq!(sink.entries()[1].subject, "gemini-2.5-pro");
    }
}
