//! # applytrack-runtime
//!
//! Generative-AI insights and note summaries for ApplyTrack.
//!
//! Requests run down an ordered chain of models until one answers.
//! Throttled models are recorded in a per-day rate-limit log, and results
//! are cached per user (and per application) with a read-time staleness
//! window. Bookkeeping failures go to a [`DiagnosticSink`] and never reach
//! the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use applytrack_runtime::{GeminiProvider, Orchestrator};
//!
//! let orchestrator = Orchestrator::builder()
//!     .provider(Arc::new(GeminiProvider::from_env()?))
//!     .build()?;
//!
//! let insights = orchestrator.insights("user-1", &applications, false).await?;
//! for line in &insights.insights {
//!     println!("{line}");
//! }
//! ```

use thiserror::Error;

pub mod cache;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod insights;
pub mod orchestrator;
pub mod parse;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod store;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CacheLookup, CachedInsights, CachedResult, CachedSummary, ResultCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CompletionSettings, ConfigError, ProviderSettings, RuntimeConfig, StoreSettings};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, RecordingSink, TracingSink};
pub use insights::{InsightGenerator, InsightService, Insights, NO_INSIGHTS_GUIDANCE};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, StoredResults};
pub use parse::{parse_insights, parse_summary, NoteSummary};
pub use providers::{
    ApiCredential, CompletionConfig, GenerationRequest, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry,
};
pub use resilience::{
    classify, FailureKind, FallbackRunner, Generation, GenerationError, GenerationOutcome,
    ModelChain, ModelId, ModelInvoker, RateLimitLog, RateLimitLogger, RateLimitRecord,
};
pub use store::{DocumentPath, DocumentStore, FileStore, MemoryStore, StoreError};
pub use summary::{NoteSummarizer, SummaryService, SummaryTarget, NO_NOTES_SUMMARY};

#[cfg(feature = "gemini")]
pub use providers::GeminiProvider;

/// Errors from the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// Display is the user-facing exhaustion message, unchanged.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}
