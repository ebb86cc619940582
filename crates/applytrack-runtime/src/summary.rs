//! Note summarization for a single application.

use applytrack_core::Note;
use std::sync::Arc;

use crate::cache::{CacheLookup, CachedSummary, ResultCache};
use crate::parse::{parse_summary, NoteSummary};
use crate::prompts::summary_prompt;
use crate::providers::GenerationRequest;
use crate::resilience::{FallbackRunner, GenerationError, ModelId};
use crate::store::DocumentPath;
use crate::RuntimeError;

/// Returned instead of calling a model when there are no notes.
pub const NO_NOTES_SUMMARY: &str =
    "No notes to summarize yet. Add notes about your interviews and interactions.";

/// Freshly generated summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summarized {
    pub summary: NoteSummary,
    pub model: Option<ModelId>,
}

/// Summarizes an application's notes.
pub struct NoteSummarizer {
    runner: Arc<FallbackRunner>,
}

impl NoteSummarizer {
    pub fn new(runner: Arc<FallbackRunner>) -> Self {
        Self { runner }
    }

    pub async fn generate(
        &self,
        notes: &[Note],
        company: &str,
        role: &str,
    ) -> Result<Summarized, GenerationError> {
        if notes.is_empty() {
            return Ok(Summarized {
                summary: NoteSummary {
                    summary: NO_NOTES_SUMMARY.to_string(),
                    takeaways: Vec::new(),
                },
                model: None,
            });
        }

        let request = GenerationRequest::new(summary_prompt(notes, company, role));
        let generation = self.runner.generate(&request).await?;

        Ok(Summarized {
            summary: parse_summary(&generation.text),
            model: Some(generation.model),
        })
    }
}

/// Identifies the application whose notes are summarized.
#[derive(Debug, Clone, Copy)]
pub struct SummaryTarget<'a> {
    pub user_id: &'a str,
    pub application_id: &'a str,
    pub company: &'a str,
    pub role: &'a str,
}

/// Cached note summaries per application.
pub struct SummaryService {
    summarizer: NoteSummarizer,
    cache: Arc<ResultCache>,
}

impl SummaryService {
    pub fn new(summarizer: NoteSummarizer, cache: Arc<ResultCache>) -> Self {
        Self { summarizer, cache }
    }

    /// Whatever is stored, fresh or not. Nothing is generated.
    pub async fn cached(
        &self,
        user_id: &str,
        application_id: &str,
    ) -> Result<Option<CachedSummary>, RuntimeError> {
        let path = DocumentPath::application_summary(user_id, application_id)?;
        Ok(self.cache.load(&path).await)
    }

    /// Serve a fresh cached summary, or summarize and persist.
    pub async fn get(
        &self,
        target: SummaryTarget<'_>,
        notes: &[Note],
        force: bool,
    ) -> Result<CachedSummary, RuntimeError> {
        let path = DocumentPath::application_summary(target.user_id, target.application_id)?;

        if !force {
            if let CacheLookup::Fresh(record) = self.cache.lookup::<CachedSummary>(&path).await {
                tracing::debug!(
                    user_id = target.user_id,
                    application_id = target.application_id,
                    "Serving cached summary"
                );
                return Ok(record);
            }
        }

        let fresh = self
            .summarizer
            .generate(notes, target.company, target.role)
            .await?;
        let record = CachedSummary {
            summary: fresh.summary.summary,
            takeaways: fresh.summary.takeaways,
            generated_at: self.cache.now(),
            model_used: fresh.model.map(|m| m.to_string()),
        };
        tracing::info!(
            user_id = target.user_id,
            application_id = target.application_id,
            notes = notes.len(),
            model = record.model_used.as_deref().unwrap_or("none"),
            "Summarized notes"
        );

        self.cache.save(&path, &record).await;
        Ok(record)
    }
}
