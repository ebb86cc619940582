//! Credential handling for generation providers.
//!
//! API keys are wrapped in [`secrecy::SecretString`] as soon as they are
//! loaded so they cannot show up in `Debug`/`Display` output or logs.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::providers::secrets::ApiCredential;
//!
//! // Config first, then the listed environment variables in order
//! let cred = ApiCredential::from_config_or_env(
//!     &config,
//!     "api_key",
//!     &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
//!     "Gemini API key",
//! )?;
//!
//! // Expose only at the point of use
//! request.header("x-goog-api-key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from configuration file/JSON
    Config,
    /// Loaded from environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// `Debug` and `Display` print `[REDACTED]`; the value is only reachable
/// through [`ApiCredential::expose`].
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a raw value.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load credential from the first set environment variable in `env_vars`.
    pub fn from_env(env_vars: &[&str], name: &'static str) -> Result<Self, ProviderError> {
        env_vars
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .map(|v| Self::new(v, CredentialSource::Environment, name))
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "{} not set: configure one of {:?}",
                    name, env_vars
                ))
            })
    }

    /// Load credential from JSON config, falling back to environment variables.
    ///
    /// 1. `config[config_key]` if it is a string
    /// 2. the first set variable in `env_vars`
    /// 3. otherwise `NotConfigured`
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_vars: &[&str],
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config[config_key].as_str() {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Some(value) = env_vars.iter().find_map(|var| std::env::var(var).ok()) {
            return Ok(Self::new(value, CredentialSource::Environment, name));
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in config or one of {:?}",
            name, config_key, env_vars
        )))
    }

    /// Check if a credential is available without loading it.
    pub fn is_available(config: &JsonValue, config_key: &str, env_vars: &[&str]) -> bool {
        config[config_key].as_str().is_some()
            || env_vars.iter().any(|var| std::env::var(var).is_ok())
    }

    /// Expose the credential value for an API call.
    ///
    /// Call this where the value is consumed (e.g. an HTTP header) and never
    /// store the result.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted_in_debug_and_display() {
        let secret = "AIza-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Config, "Test API key");

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(secret), "Secret exposed in Debug!");
        assert!(debug.contains("[REDACTED]"));

        let display = format!("{}", cred);
        assert!(!display.contains(secret), "Secret exposed in Display!");
        assert!(display.contains("Test API key"));
        assert!(display.contains("config"));
    }

    #[test]
    fn test_credential_expose() {
        let cred = ApiCredential::new("k", CredentialSource::Programmatic, "Test API key");
        assert_eq!(cred.expose(), "k");
        assert!(!cred.is_empty());
        assert_eq!(cred.source(), CredentialSource::Programmatic);
    }

    #[test]
    fn test_from_config_or_env_prefers_config() {
        let config = serde_json::json!({ "api_key": "config-key" });

        std::env::set_var("APPLYTRACK_TEST_KEY_PRIORITY", "env-key");
        let cred = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            &["APPLYTRACK_TEST_KEY_PRIORITY"],
            "Test key",
        )
        .unwrap();

        assert_eq!(cred.expose(), "config-key");
        assert_eq!(cred.source(), CredentialSource::Config);

        std::env::remove_var("APPLYTRACK_TEST_KEY_PRIORITY");
    }

    #[test]
    fn test_from_config_or_env_walks_env_vars_in_order() {
        let config = serde_json::json!({});

        std::env::set_var("APPLYTRACK_TEST_KEY_SECOND", "second");
        let cred = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            &["APPLYTRACK_TEST_KEY_UNSET_1", "APPLYTRACK_TEST_KEY_SECOND"],
            "Test key",
        )
        .unwrap();

        assert_eq!(cred.expose(), "second");
        assert_eq!(cred.source(), CredentialSource::Environment);

        std::env::remove_var("APPLYTRACK_TEST_KEY_SECOND");
    }

    #[test]
    fn test_from_config_or_env_error_when_missing() {
        let err = ApiCredential::from_config_or_env(
            &serde_json::json!({}),
            "api_key",
            &["APPLYTRACK_TEST_KEY_UNSET_2"],
            "Test key",
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Test key"));
        assert!(msg.contains("api_key"));
        assert!(msg.contains("APPLYTRACK_TEST_KEY_UNSET_2"));
    }

    #[test]
    fn test_is_available() {
        let config = serde_json::json!({ "api_key": "value" });
        assert!(ApiCredential::is_available(&config, "api_key", &[]));
        assert!(!ApiCredential::is_available(
            &serde_json::json!({}),
            "api_key",
            &["APPLYTRACK_TEST_KEY_UNSET_3"]
        ));
    }
}
