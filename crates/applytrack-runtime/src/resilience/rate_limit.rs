//! Day-scoped log of throttled models.
//!
//! One document per calendar day at `ai_rate_limits/{YYYY-MM-DD}`. The first
//! throttled model of the day creates it; later ones are set-unioned in.
//! Used for observability only; nothing reads it back on the hot path.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::fallback::ModelId;
use crate::clock::Clock;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::store::{from_document, to_document, DocumentPath, DocumentStore, Patch, StoreError};

/// Persisted rate-limit record for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    /// Day key, `YYYY-MM-DD`
    pub date: String,

    /// Models throttled that day, in order of first failure
    #[serde(default)]
    pub failed_models: Vec<String>,

    pub last_updated: DateTime<Utc>,
}

impl RateLimitRecord {
    pub fn contains(&self, model: &str) -> bool {
        self.failed_models.iter().any(|m| m == model)
    }
}

/// Receiver for rate-limited attempts.
///
/// Recording never fails from the caller's point of view.
#[async_trait]
pub trait RateLimitLog: Send + Sync {
    async fn record(&self, model: &ModelId);
}

/// Store-backed rate-limit log.
pub struct RateLimitLogger {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
}

impl RateLimitLogger {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self { store, clock, sink }
    }

    /// Read the record for a day.
    pub async fn fetch(&self, day: NaiveDate) -> Result<Option<RateLimitRecord>, StoreError> {
        let path = DocumentPath::rate_limits(&day_key(day))?;
        match self.store.get(&path).await? {
            Some(doc) => Ok(Some(from_document(&path, doc)?)),
            None => Ok(None),
        }
    }

    /// Read today's record.
    pub async fn fetch_today(&self) -> Result<Option<RateLimitRecord>, StoreError> {
        self.fetch(self.clock.today()).await
    }

    async fn upsert(&self, model: &ModelId) -> Result<(), StoreError> {
        let date = day_key(self.clock.today());
        let now = self.clock.now();
        let path = DocumentPath::rate_limits(&date)?;

        if self.store.get(&path).await?.is_some() {
            let patch = Patch::new()
                .array_union("failedModels", vec![Value::String(model.to_string())])
                .set(
                    "lastUpdated",
                    now.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                );
            self.store.update(&path, patch).await
        } else {
            let record = RateLimitRecord {
                date,
                failed_models: vec![model.to_string()],
                last_updated: now,
            };
            self.store.set(&path, to_document(&record)?).await
        }
    }
}

#[async_trait]
impl RateLimitLog for RateLimitLogger {
    async fn record(&self, model: &ModelId) {
        match self.upsert(model).await {
            Ok(()) => tracing::debug!(model = %model, "Recorded rate-limited model"),
            Err(e) => self.sink.report(Diagnostic::new(
                DiagnosticKind::RateLimitLog,
                model.as_str(),
                e.to_string(),
            )),
        }
    }
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
