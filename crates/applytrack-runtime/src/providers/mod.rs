//! Generation provider abstractions for applytrack-runtime.
//!
//! This module defines the trait for hosted generative-AI backends and
//! includes the Gemini implementation.
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling.
//! See [`ApiCredential`] for the recommended patterns.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

mod factory;
pub mod secrets;

#[cfg(feature = "gemini")]
mod gemini;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "gemini")]
pub use gemini::{GeminiProvider, GeminiProviderFactory};

/// Errors from generation providers.
///
/// The rendered message is what the fallback chain classifies, so variants
/// carry the HTTP status and the backend's own error text.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// A single opaque prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Per-call settings for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model identifier to call
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,
}

impl CompletionConfig {
    /// Same settings, different model.
    pub fn for_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model that produced the text, as reported by the backend
    pub model: String,

    /// Finish reason
    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping generation backends.
///
/// Implementations make exactly one remote call per `complete` and never
/// retry; retrying across models is the fallback chain's job.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute one completion against `config.model`.
    async fn complete(
        &self,
        request: &GenerationRequest,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Check if provider is usable.
    async fn health_check(&self) -> bool;

    /// Get provider name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_model_keeps_other_settings() {
        let base = CompletionConfig {
            max_tokens: 42,
            ..Default::default()
        };
        let derived = base.for_model("gemini-2.0-flash");
        assert_eq!(derived.model, "gemini-2.0-flash");
        assert_eq!(derived.max_tokens, 42);
        assert_eq!(derived.timeout, base.timeout);
    }

    #[test]
    fn test_error_messages_carry_status() {
        let err = ProviderError::ApiError {
            status: 503,
            message: "The model is overloaded.".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - The model is overloaded.");

        let err = ProviderError::RateLimited {
            status: 429,
            message: "Resource has been exhausted".to_string(),
        };
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }
}
