//! Runtime facade wiring providers, storage and caching together.
//!
//! The orchestrator owns one fallback chain shared by insight generation
//! and note summarization, one result cache, and the rate-limit log the
//! chain reports to. Build it with [`OrchestratorBuilder`].

use applytrack_core::{Application, Freshness, Note};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::cache::{CachedInsights, CachedSummary, ResultCache};
use crate::clock::{Clock, SystemClock};
use crate::config::RuntimeConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::insights::{InsightGenerator, InsightService};
use crate::providers::LlmProvider;
use crate::resilience::{FallbackRunner, ModelChain, ModelInvoker, RateLimitLogger, RateLimitRecord};
use crate::store::{open_store, DocumentPath, DocumentStore};
use crate::summary::{NoteSummarizer, SummaryService, SummaryTarget};
use crate::RuntimeError;

/// Entry point for insight and summary generation.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    runner: Arc<FallbackRunner>,
    insights: InsightService,
    summaries: SummaryService,
    results: StoredResults,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Whether the provider reports itself usable. Makes no model call.
    pub async fn provider_ready(&self) -> bool {
        self.provider.health_check().await
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Insights for a user, served from cache while fresh.
    pub async fn insights(
        &self,
        user_id: &str,
        applications: &[Application],
        force: bool,
    ) -> Result<CachedInsights, RuntimeError> {
        self.insights.get(user_id, applications, force).await
    }

    /// Stored insights, without generating.
    pub async fn cached_insights(&self, user_id: &str) -> Result<Option<CachedInsights>, RuntimeError> {
        self.insights.cached(user_id).await
    }

    /// Note summary for one application, served from cache while fresh.
    pub async fn summary(
        &self,
        target: SummaryTarget<'_>,
        notes: &[Note],
        force: bool,
    ) -> Result<CachedSummary, RuntimeError> {
        self.summaries.get(target, notes, force).await
    }

    /// Stored summary, without generating.
    pub async fn cached_summary(
        &self,
        user_id: &str,
        application_id: &str,
    ) -> Result<Option<CachedSummary>, RuntimeError> {
        self.summaries.cached(user_id, application_id).await
    }

    /// Rate-limit record for a given day.
    pub async fn rate_limits_on(&self, day: NaiveDate) -> Result<Option<RateLimitRecord>, RuntimeError> {
        self.results.rate_limits_on(day).await
    }

    /// Rate-limit record for today.
    pub async fn rate_limits_today(&self) -> Result<Option<RateLimitRecord>, RuntimeError> {
        self.results.rate_limits_today().await
    }

    pub fn model_chain(&self) -> &ModelChain {
        self.runner.chain()
    }

    /// Name of the document store backend.
    pub fn store_name(&self) -> &str {
        self.results.store_name()
    }
}

/// Read-only view of what earlier runs persisted.
///
/// Needs no provider, so it works without generation credentials.
pub struct StoredResults {
    store: Arc<dyn DocumentStore>,
    cache: Arc<ResultCache>,
    rate_limits: Arc<RateLimitLogger>,
}

impl StoredResults {
    fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn DiagnosticSink>,
        freshness: Freshness,
    ) -> Self {
        Self {
            cache: Arc::new(ResultCache::new(store.clone(), clock.clone(), sink.clone(), freshness)),
            rate_limits: Arc::new(RateLimitLogger::new(store.clone(), clock, sink)),
            store,
        }
    }

    pub async fn cached_insights(&self, user_id: &str) -> Result<Option<CachedInsights>, RuntimeError> {
        let path = DocumentPath::user_insights(user_id)?;
        Ok(self.cache.load(&path).await)
    }

    pub async fn cached_summary(
        &self,
        user_id: &str,
        application_id: &str,
    ) -> Result<Option<CachedSummary>, RuntimeError> {
        let path = DocumentPath::application_summary(user_id, application_id)?;
        Ok(self.cache.load(&path).await)
    }

    pub async fn rate_limits_on(&self, day: NaiveDate) -> Result<Option<RateLimitRecord>, RuntimeError> {
        Ok(self.rate_limits.fetch(day).await?)
    }

    pub async fn rate_limits_today(&self) -> Result<Option<RateLimitRecord>, RuntimeError> {
        Ok(self.rate_limits.fetch_today().await?)
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    store: Option<Arc<dyn DocumentStore>>,
    clock: Option<Arc<dyn Clock>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    config: RuntimeConfig,
}

impl OrchestratorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            provider: None,
            store: None,
            clock: None,
            sink: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the generation provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use this store instead of the one named in the configuration.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Where swallowed failures go. Defaults to `tracing`.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<Orchestrator, RuntimeError> {
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| RuntimeError::ProviderNotConfigured("No provider set".to_string()))?;
        let chain = self.config.model_chain()?;
        let completion = self.config.completion_config();
        let results = self.build_results()?;

        tracing::debug!(
            provider = provider.name(),
            store = results.store_name(),
            models = chain.len(),
            "Building orchestrator"
        );

        let runner = Arc::new(FallbackRunner::new(
            ModelInvoker::new(provider.clone(), completion),
            chain,
            results.rate_limits.clone(),
        ));

        Ok(Orchestrator {
            provider,
            insights: InsightService::new(InsightGenerator::new(runner.clone()), results.cache.clone()),
            summaries: SummaryService::new(NoteSummarizer::new(runner.clone()), results.cache.clone()),
            runner,
            results,
        })
    }

    /// Build only the read side. No provider is needed.
    pub fn build_results(self) -> Result<StoredResults, RuntimeError> {
        self.config.validate()?;
        let freshness = self.config.freshness()?;

        let store = self.store.unwrap_or_else(|| open_store(&self.config.store));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));

        Ok(StoredResults::new(store, clock, sink, freshness))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::diagnostics::{DiagnosticKind, RecordingSink};
    use crate::resilience::{GenerationError, EXHAUSTED_HINT};
    use crate::store::MemoryStore;
    use crate::test_support::{FlakyStore, ScriptedProvider};
    use applytrack_core::ApplicationStage;
    use chrono::{TimeZone, Utc};

    fn config(models: &[&str]) -> RuntimeConfig {
        RuntimeConfig {
            model_chain: models.iter().map(|m| m.to_string()).collect(),
            ..RuntimeConfig::default()
        }
    }

    fn applications() -> Vec<Application> {
        vec![Application::new(
            "a1",
            "Initech",
            "Backend",
            ApplicationStage::Interview,
            Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap(),
        )]
    }

    #[test]
    fn test_build_requires_provider() {
        let result = OrchestratorBuilder::new().build();
        assert!(matches!(result, Err(RuntimeError::ProviderNotConfigured(_))));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = Orchestrator::builder()
            .provider(Arc::new(ScriptedProvider::always("x")))
            .config(config(&[]))
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }

    #[tokio::test]
    async fn test_exhaustion_logs_every_model_for_the_day() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .fail_status("m1", 429, "Too Many Requests")
                .fail_status("m2", 503, "Service Unavailable")
                .fail("m3", "Quota exceeded for metric"),
        );
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 20, 15, 0, 0).unwrap()));
        let sink = Arc::new(RecordingSink::new());
        let orchestrator = Orchestrator::builder()
            .provider(provider.clone())
            .store(Arc::new(MemoryStore::new()))
            .clock(clock)
            .sink(sink.clone())
            .config(config(&["m1", "m2", "m3"]))
            .build()
            .unwrap();

        let err = orchestrator
            .insights("u1", &applications(), false)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::Generation(GenerationError::AllModelsExhausted { .. })
        ));
        assert!(err.to_string().ends_with(EXHAUSTED_HINT));
        assert!(err.to_string().starts_with("HTTP request failed: Quota exceeded for metric"));
        assert_eq!(provider.calls(), vec!["m1", "m2", "m3"]);

        let record = orchestrator.rate_limits_today().await.unwrap().unwrap();
        assert_eq!(record.date, "2025-09-20");
        assert_eq!(record.failed_models, vec!["m1", "m2", "m3"]);
        assert!(sink.is_empty());
        assert!(orchestrator.cached_insights("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shared_chain_serves_both_services() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .fail_status("m1", 429, "rate limit")
                .reply("m2", "SUMMARY: Going well.\nTAKEAWAY: Send thanks."),
        );
        let orchestrator = Orchestrator::builder()
            .provider(provider.clone())
            .clock(Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 21, 9, 0, 0).unwrap())))
            .sink(Arc::new(RecordingSink::new()))
            .config(config(&["m1", "m2"]))
            .build()
            .unwrap();

        let target = SummaryTarget {
            user_id: "u1",
            application_id: "a1",
            company: "Initech",
            role: "Backend",
        };
        let notes = vec![Note::new("n1", "Good chat", Utc.with_ymd_and_hms(2025, 9, 19, 9, 0, 0).unwrap())];

        let summary = orchestrator.summary(target, &notes, false).await.unwrap();

        assert_eq!(summary.summary, "Going well.");
        assert_eq!(summary.model_used.as_deref(), Some("m2"));
        assert_eq!(orchestrator.model_chain().len(), 2);
        assert_eq!(orchestrator.store_name(), "memory");

        let day = NaiveDate::from_ymd_opt(2025, 9, 21).unwrap();
        let record = orchestrator.rate_limits_on(day).await.unwrap().unwrap();
        assert_eq!(record.failed_models, vec!["m1"]);

        let cached = orchestrator.cached_summary("u1", "a1").await.unwrap().unwrap();
        assert_eq!(cached.takeaways, vec!["Send thanks."]);
    }

    #[tokio::test]
    async fn test_failed_bookkeeping_does_not_stop_the_chain() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .fail_status("m1", 429, "Too Many Requests")
                .reply("m2", "ok line."),
        );
        let sink = Arc::new(RecordingSink::new());
        let orchestrator = Orchestrator::builder()
            .provider(provider.clone())
            .store(Arc::new(FlakyStore::failing_writes()))
            .clock(Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 22, 8, 0, 0).unwrap())))
            .sink(sink.clone())
            .config(config(&["m1", "m2"]))
            .build()
            .unwrap();

        let insights = orchestrator.insights("u1", &applications(), false).await.unwrap();

        assert_eq!(insights.insights, vec!["ok line."]);
        assert_eq!(insights.model_used.as_deref(), Some("m2"));
        assert_eq!(provider.calls(), vec!["m1", "m2"]);
        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.count(DiagnosticKind::RateLimitLog), 1);
        assert_eq!(sink.count(DiagnosticKind::CacheWrite), 1);
    }

    #[tokio::test]
    async fn test_provider_ready_reflects_health_check() {
        let ready = Orchestrator::builder()
            .provider(Arc::new(ScriptedProvider::always("x")))
            .build()
            .unwrap();
        assert!(ready.provider_ready().await);
        assert_eq!(ready.provider_name(), "scripted");

        let offline = Orchestrator::builder()
            .provider(Arc::new(ScriptedProvider::always("x").offline()))
            .build()
            .unwrap();
        assert!(!offline.provider_ready().await);
    }

    #[tokio::test]
    async fn test_stored_results_read_without_provider() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 23, 10, 0, 0).unwrap()));
        let writer = Orchestrator::builder()
            .provider(Arc::new(
                ScriptedProvider::new()
                    .fail_status("m1", 429, "rate limit")
                    .reply("m2", "Follow up with Initech."),
            ))
            .store(store.clone())
            .clock(clock.clone())
            .sink(Arc::new(RecordingSink::new()))
            .config(config(&["m1", "m2"]))
            .build()
            .unwrap();
        let generated = writer.insights("u1", &applications(), false).await.unwrap();

        let results = Orchestrator::builder()
            .store(store)
            .clock(clock)
            .config(config(&["m1", "m2"]))
            .build_results()
            .unwrap();

        assert_eq!(results.cached_insights("u1").await.unwrap(), Some(generated));
        assert!(results.cached_summary("u1", "a1").await.unwrap().is_none());
        let record = results.rate_limits_today().await.unwrap().unwrap();
        assert_eq!(record.failed_models, vec!["m1"]);
        assert_eq!(results.store_name(), "memory");
    }
}
