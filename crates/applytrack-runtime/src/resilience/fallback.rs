//! Model fallback chain.
//!
//! A generation request is tried against each model of an ordered chain
//! until one succeeds. Rate-limited attempts are recorded in the day's
//! rate-limit log; every other failure simply moves on to the next model.
//! Each call starts again from the first model.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::classify::{classify, FailureKind};
use super::rate_limit::RateLimitLog;
use crate::providers::{CompletionConfig, GenerationRequest, LlmProvider};

/// Appended to the last failure message when every model failed.
pub const EXHAUSTED_HINT: &str =
    "Free request rate limits may have been exceeded. Please try again later.";

/// Used when no attempt produced a message (empty chain).
pub const NO_MODEL_MESSAGE: &str = "All AI models are currently unavailable.";

/// Terminal failure of a generation request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Every model in the chain failed. Display is the user-facing message.
    #[error("{message}")]
    AllModelsExhausted { message: String, attempts: usize },

    #[error("Failed to build prompt: {0}")]
    InvalidPrompt(String),
}

/// Name of a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Problems with a configured chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("model chain is empty")]
    Empty,

    #[error("model '{0}' appears more than once in the chain")]
    Duplicate(String),

    #[error("model chain contains a blank identifier")]
    Blank,
}

/// Ordered, most-preferred-first list of models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChain {
    models: Vec<ModelId>,
}

impl ModelChain {
    /// Build a chain, rejecting empty lists, blanks and duplicates.
    pub fn new<I, S>(models: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<ModelId> = models
            .into_iter()
            .map(|m| ModelId::new(m.into().trim().to_string()))
            .collect();

        if models.is_empty() {
            return Err(ChainError::Empty);
        }

        let mut seen = HashSet::new();
        for model in &models {
            if model.as_str().is_empty() {
                return Err(ChainError::Blank);
            }
            if !seen.insert(model.as_str()) {
                return Err(ChainError::Duplicate(model.to_string()));
            }
        }

        Ok(Self { models })
    }

    /// Default Gemini chain, newest and most capable first.
    pub fn default_chain() -> Self {
        Self {
            models: DEFAULT_MODEL_CHAIN.iter().map(|m| ModelId::new(*m)).collect(),
        }
    }

    pub fn models(&self) -> &[ModelId] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelChain {
    fn default() -> Self {
        Self::default_chain()
    }
}

/// Model identifiers used when no chain is configured.
pub const DEFAULT_MODEL_CHAIN: [&str; 6] = [
    "gemini-3-pro-preview",
    "gemini-3-flash-preview",
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
];

/// Result of one attempt against one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(String),
    Failure { kind: FailureKind, message: String },
}

/// Issues exactly one request to one model.
pub struct ModelInvoker {
    provider: Arc<dyn LlmProvider>,
    settings: CompletionConfig,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: CompletionConfig) -> Self {
        Self { provider, settings }
    }

    pub async fn invoke(&self, model: &ModelId, request: &GenerationRequest) -> GenerationOutcome {
        let config = self.settings.for_model(model.as_str());
        match self.provider.complete(request, &config).await {
            Ok(response) => {
                tracing::debug!(
                    model = %model,
                    provider = self.provider.name(),
                    tokens = response.usage.total(),
                    "Generation succeeded"
                );
                GenerationOutcome::Success(response.content)
            }
            Err(e) => {
                let message = e.to_string();
                GenerationOutcome::Failure {
                    kind: classify(&message),
                    message,
                }
            }
        }
    }
}

/// Text produced by the chain and the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub model: ModelId,
    /// 1-based position of the model that succeeded
    pub attempts: usize,
}

/// Runs a request down the model chain.
pub struct FallbackRunner {
    invoker: ModelInvoker,
    chain: ModelChain,
    rate_limits: Arc<dyn RateLimitLog>,
}

impl FallbackRunner {
    pub fn new(invoker: ModelInvoker, chain: ModelChain, rate_limits: Arc<dyn RateLimitLog>) -> Self {
        Self {
            invoker,
            chain,
            rate_limits,
        }
    }

    pub fn chain(&self) -> &ModelChain {
        &self.chain
    }

    /// Try each model in order; return the first success.
    ///
    /// Attempts are strictly sequential. Only exhaustion is reported to the
    /// caller, as the last failure message followed by [`EXHAUSTED_HINT`].
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let mut last_error: Option<String> = None;

        for (index, model) in self.chain.models().iter().enumerate() {
            match self.invoker.invoke(model, request).await {
                GenerationOutcome::Success(text) => {
                    return Ok(Generation {
                        text,
                        model: model.clone(),
                        attempts: index + 1,
                    });
                }
                GenerationOutcome::Failure { kind, message } => {
                    tracing::warn!(model = %model, kind = ?kind, error = %message, "Model failed");
                    if kind == FailureKind::RateLimited {
                        self.rate_limits.record(model).await;
                    }
                    last_error = Some(message);
                }
            }
        }

        let last = last_error.unwrap_or_else(|| NO_MODEL_MESSAGE.to_string());
        Err(GenerationError::AllModelsExhausted {
            message: format!("{} {}", last, EXHAUSTED_HINT),
            attempts: self.chain.len(),
        })
    }
}
