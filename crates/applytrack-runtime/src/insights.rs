//! Insight generation over a user's application history.

use applytrack_core::{Application, ApplicationStage};
use std::sync::Arc;

use crate::cache::{CacheLookup, CachedInsights, ResultCache};
use crate::parse::parse_insights;
use crate::prompts::insights_prompt;
use crate::providers::GenerationRequest;
use crate::resilience::{FallbackRunner, GenerationError, ModelId};
use crate::store::DocumentPath;
use crate::RuntimeError;

/// Returned instead of calling a model when nothing has progressed.
pub const NO_INSIGHTS_GUIDANCE: &str =
    "Add more applications and move them beyond the \"Applied\" stage to get personalized insights.";

/// Most recent applications sent to the model.
pub const MAX_INSIGHT_APPLICATIONS: usize = 50;

/// Applications worth analysing: past the applied stage, newest first,
/// at most [`MAX_INSIGHT_APPLICATIONS`].
pub fn select_applications(applications: &[Application]) -> Vec<&Application> {
    let mut selected: Vec<&Application> = applications
        .iter()
        .filter(|app| app.stage != ApplicationStage::Applied)
        .collect();
    selected.sort_by(|a, b| b.application_date.cmp(&a.application_date));
    selected.truncate(MAX_INSIGHT_APPLICATIONS);
    selected
}

/// Freshly generated insights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insights {
    pub insights: Vec<String>,
    /// `None` when no model was consulted
    pub model: Option<ModelId>,
}

/// Turns an application list into short observations.
pub struct InsightGenerator {
    runner: Arc<FallbackRunner>,
}

impl InsightGenerator {
    pub fn new(runner: Arc<FallbackRunner>) -> Self {
        Self { runner }
    }

    pub async fn generate(&self, applications: &[Application]) -> Result<Insights, GenerationError> {
        let selected = select_applications(applications);
        if selected.is_empty() {
            return Ok(Insights {
                insights: vec![NO_INSIGHTS_GUIDANCE.to_string()],
                model: None,
            });
        }

        let prompt =
            insights_prompt(&selected).map_err(|e| GenerationError::InvalidPrompt(e.to_string()))?;
        let generation = self.runner.generate(&GenerationRequest::new(prompt)).await?;

        Ok(Insights {
            insights: parse_insights(&generation.text),
            model: Some(generation.model),
        })
    }
}

/// Cached insights per user.
pub struct InsightService {
    generator: InsightGenerator,
    cache: Arc<ResultCache>,
}

impl InsightService {
    pub fn new(generator: InsightGenerator, cache: Arc<ResultCache>) -> Self {
        Self { generator, cache }
    }

    /// Whatever is stored, fresh or not. Nothing is generated.
    pub async fn cached(&self, user_id: &str) -> Result<Option<CachedInsights>, RuntimeError> {
        let path = DocumentPath::user_insights(user_id)?;
        Ok(self.cache.load(&path).await)
    }

    /// Serve fresh cached insights, or regenerate and persist.
    ///
    /// `force` skips the cache read entirely. A failed save still returns
    /// the new insights.
    pub async fn get(
        &self,
        user_id: &str,
        applications: &[Application],
        force: bool,
    ) -> Result<CachedInsights, RuntimeError> {
        let path = DocumentPath::user_insights(user_id)?;

        if !force {
            match self.cache.lookup::<CachedInsights>(&path).await {
                CacheLookup::Fresh(record) => {
                    tracing::debug!(user_id, "Serving cached insights");
                    return Ok(record);
                }
                CacheLookup::Stale(record) => {
                    tracing::debug!(user_id, generated_at = %record.generated_at, "Cached insights are stale");
                }
                CacheLookup::Missing => {}
            }
        }

        let fresh = self.generator.generate(applications).await?;
        let record = CachedInsights {
            insights: fresh.insights,
            generated_at: self.cache.now(),
            model_used: fresh.model.map(|m| m.to_string()),
        };
        tracing::info!(
            user_id,
            forced = force,
            model = record.model_used.as_deref().unwrap_or("none"),
            count = record.insights.len(),
            "Regenerated insights"
        );

        self.cache.save(&path, &record).await;
        Ok(record)
    }
}
