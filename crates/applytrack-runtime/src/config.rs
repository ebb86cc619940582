//! Runtime configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty document is a
//! valid configuration:
//!
//! ```yaml
//! model_chain:
//!   - gemini-2.5-pro
//!   - gemini-2.5-flash
//! staleness_window: 7days
//! completion:
//!   max_tokens: 1024
//!   temperature: 0.7
//!   timeout: 60s
//! provider:
//!   type: gemini
//!   settings:
//!     api_key: "..."
//! store:
//!   backend: file
//!   root: ./applytrack-data
//! ```

use applytrack_core::Freshness;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::providers::CompletionConfig;
use crate::resilience::{ChainError, ModelChain, DEFAULT_MODEL_CHAIN};

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid model chain: {0}")]
    Chain(#[from] ChainError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Models to try, most preferred first
    pub model_chain: Vec<String>,

    /// Age after which cached results are regenerated
    #[serde(with = "duration_human")]
    pub staleness_window: Duration,

    pub completion: CompletionSettings,

    pub provider: ProviderSettings,

    pub store: StoreSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model_chain: DEFAULT_MODEL_CHAIN.iter().map(|m| m.to_string()).collect(),
            staleness_window: Duration::from_secs(7 * 24 * 60 * 60),
            completion: CompletionSettings::default(),
            provider: ProviderSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

/// Generation parameters shared by every model in the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    pub max_tokens: u32,

    pub temperature: f32,

    /// Transport timeout for one model call
    #[serde(with = "duration_human")]
    pub timeout: Duration,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        let defaults = CompletionConfig::default();
        Self {
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout: defaults.timeout,
        }
    }
}

/// Which provider factory to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    #[serde(rename = "type")]
    pub kind: String,

    /// Passed through to the provider factory
    pub settings: serde_json::Value,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: "gemini".to_string(),
            settings: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Document store backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreSettings {
    /// Process-local; nothing survives a restart
    #[default]
    Memory,

    /// One JSON file per document under `root`
    File { root: PathBuf },
}

impl RuntimeConfig {
    /// Parse and validate YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load, parse and validate a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded runtime config");
        Self::from_yaml(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model_chain()?;

        if self.staleness_window.is_zero() {
            return Err(ConfigError::Invalid(
                "staleness_window must be greater than zero".to_string(),
            ));
        }
        if self.completion.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "completion.max_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn model_chain(&self) -> Result<ModelChain, ConfigError> {
        Ok(ModelChain::new(self.model_chain.iter().cloned())?)
    }

    pub fn freshness(&self) -> Result<Freshness, ConfigError> {
        chrono::Duration::from_std(self.staleness_window)
            .map(Freshness::new)
            .map_err(|e| ConfigError::Invalid(format!("staleness_window: {}", e)))
    }

    /// Base completion settings; the model is filled in per attempt.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            max_tokens: self.completion.max_tokens,
            temperature: self.completion.temperature,
            timeout: self.completion.timeout,
            ..CompletionConfig::default()
        }
    }
}

mod duration_human {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
