//! Persisted cache of generated insights and note summaries.
//!
//! Records are overwritten on every regeneration and never deleted.
//! Staleness is decided at read time against the configured window.

use applytrack_core::Freshness;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::store::{from_document, to_document, DocumentPath, DocumentStore, StoreError};

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// A cached record that knows when it was generated.
pub trait CachedResult: Serialize + DeserializeOwned + Send {
    fn generated_at(&self) -> DateTime<Utc>;
}

/// Cached insights for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedInsights {
    #[serde(default)]
    pub insights: Vec<String>,

    /// Missing timestamps read as the epoch, i.e. stale
    #[serde(default = "epoch")]
    pub generated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl CachedResult for CachedInsights {
    fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

/// Cached note summary for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSummary {
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub takeaways: Vec<String>,

    #[serde(default = "epoch")]
    pub generated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl CachedResult for CachedSummary {
    fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

/// Outcome of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    Missing,
    Fresh(T),
    Stale(T),
}

impl<T> CacheLookup<T> {
    /// The record, if it may be served without regenerating.
    pub fn fresh(self) -> Option<T> {
        match self {
            CacheLookup::Fresh(record) => Some(record),
            _ => None,
        }
    }
}

/// Store-backed result cache with read-time staleness.
pub struct ResultCache {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
    freshness: Freshness,
}

impl ResultCache {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn DiagnosticSink>,
        freshness: Freshness,
    ) -> Self {
        Self {
            store,
            clock,
            sink,
            freshness,
        }
    }

    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Read a record without judging its age.
    ///
    /// Read and decode failures are reported and read as a miss.
    pub async fn load<T: CachedResult>(&self, path: &DocumentPath) -> Option<T> {
        match self.read(path).await {
            Ok(record) => record,
            Err(e) => {
                self.sink.report(Diagnostic::new(
                    DiagnosticKind::CacheRead,
                    path.to_string(),
                    e.to_string(),
                ));
                None
            }
        }
    }

    /// Read a record and classify it against the staleness window.
    pub async fn lookup<T: CachedResult>(&self, path: &DocumentPath) -> CacheLookup<T> {
        match self.load::<T>(path).await {
            None => CacheLookup::Missing,
            Some(record) => {
                if self.freshness.is_fresh(record.generated_at(), self.clock.now()) {
                    CacheLookup::Fresh(record)
                } else {
                    CacheLookup::Stale(record)
                }
            }
        }
    }

    /// Overwrite a record. Failures are reported, never returned.
    pub async fn save<T: CachedResult + Sync>(&self, path: &DocumentPath, record: &T) {
        let result = match to_document(record) {
            Ok(doc) => self.store.set(path, doc).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => tracing::debug!(path = %path, store = self.store.name(), "Cached result saved"),
            Err(e) => self.sink.report(Diagnostic::new(
                DiagnosticKind::CacheWrite,
                path.to_string(),
                e.to_string(),
            )),
        }
    }

    async fn read<T: CachedResult>(&self, path: &DocumentPath) -> Result<Option<T>, StoreError> {
        match self.store.get(path).await? {
            Some(doc) => Ok(Some(from_document(path, doc)?)),
            None => Ok(None),
        }
    }
}
