//! Test doubles shared across module tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;

use crate::providers::{
    CompletionConfig, CompletionResponse, GenerationRequest, LlmProvider, ProviderError,
    TokenUsage,
};
use crate::resilience::{ModelId, RateLimitLog};
use crate::store::{Document, DocumentPath, DocumentStore, MemoryStore, Patch, StoreError};

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(String),
    Status(u16, String),
}

/// Provider whose answer depends on the requested model.
///
/// Unscripted models fail with an HTTP error.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: HashMap<String, Script>,
    fallback: Option<String>,
    offline: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every model answers with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::default()
        }
    }

    /// Health check reports the provider unusable.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn reply(mut self, model: &str, text: impl Into<String>) -> Self {
        self.scripts.insert(model.to_string(), Script::Reply(text.into()));
        self
    }

    pub fn fail(mut self, model: &str, message: impl Into<String>) -> Self {
        self.scripts.insert(model.to_string(), Script::Fail(message.into()));
        self
    }

    pub fn fail_status(mut self, model: &str, status: u16, message: impl Into<String>) -> Self {
        self.scripts
            .insert(model.to_string(), Script::Status(status, message.into()));
        self
    }

    /// Models called, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        request: &GenerationRequest,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls
            .lock()
            .push((config.model.clone(), request.prompt.clone()));

        let script = match self.scripts.get(&config.model) {
            Some(script) => script.clone(),
            None => match &self.fallback {
                Some(text) => Script::Reply(text.clone()),
                None => Script::Fail(format!("no script for {}", config.model)),
            },
        };

        match script {
            Script::Reply(content) => Ok(CompletionResponse {
                content,
                usage: TokenUsage::default(),
                model: config.model.clone(),
                stop_reason: Some("STOP".to_string()),
            }),
            Script::Fail(message) => Err(ProviderError::HttpError(message)),
            Script::Status(429, message) => Err(ProviderError::RateLimited {
                status: 429,
                message,
            }),
            Script::Status(status, message) => Err(ProviderError::ApiError { status, message }),
        }
    }

    async fn health_check(&self) -> bool {
        !self.offline
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Rate-limit log that only remembers what it was told.
#[derive(Debug, Default)]
pub struct RecordingRateLog {
    models: Mutex<Vec<String>>,
}

impl RecordingRateLog {
    pub fn models(&self) -> Vec<String> {
        self.models.lock().clone()
    }
}

#[async_trait]
impl RateLimitLog for RecordingRateLog {
    async fn record(&self, model: &ModelId) {
        self.models.lock().push(model.to_string());
    }
}

/// In-memory store with injectable read or write failures.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: bool,
    fail_writes: bool,
}

impl FlakyStore {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(io::Error::other("injected write failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Io(io::Error::other("injected read failure")));
        }
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocumentPath, doc: Document) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.set(path, doc).await
    }

    async fn update(&self, path: &DocumentPath, patch: Patch) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.update(path, patch).await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}
