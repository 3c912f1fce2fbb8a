//! AI provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::extraction::{AiSettings, ModelAllowList, Provider, MAX_OUTPUT_TOKENS_LIMIT};

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// Google (Gemini) API key
    pub google_api_key: Option<Secret<String>>,

    /// Provider used when the settings store has no override
    #[serde(default = "default_provider")]
    pub default_provider: Provider,

    /// Model used when the settings store has no override
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Allowed OpenAI model ids
    #[serde(default = "default_openai_models")]
    pub openai_models: Vec<String>,

    /// Allowed Gemini model ids
    #[serde(default = "default_gemini_models")]
    pub gemini_models: Vec<String>,

    /// Maximum output tokens per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum calls per extraction, including the first
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds, doubled per retry
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// OpenAI API base URL override
    pub openai_base_url: Option<String>,

    /// Gemini API base URL override
    pub gemini_base_url: Option<String>,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get base backoff delay as Duration
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Returns the non-empty API key for `provider`
    pub fn api_key(&self, provider: Provider) -> Option<Secret<String>> {
        let key = match provider {
            Provider::OpenAI => self.openai_api_key.as_ref(),
            Provider::Gemini => self.google_api_key.as_ref(),
        };
        key.filter(|k| !k.expose_secret().trim().is_empty()).cloned()
    }

    /// Check if a provider has a key configured
    pub fn has_key(&self, provider: Provider) -> bool {
        self.api_key(provider).is_some()
    }

    /// Allowed model ids per provider
    pub fn allow_list(&self) -> ModelAllowList {
        ModelAllowList::new()
            .with_models(Provider::OpenAI, self.openai_models.iter().cloned())
            .with_models(Provider::Gemini, self.gemini_models.iter().cloned())
    }

    /// Settings built from the configured defaults
    pub fn default_settings(&self) -> AiSettings {
        AiSettings::new(self.default_provider, self.default_model.clone(), self.max_tokens)
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !Provider::ALL.iter().any(|p| self.has_key(*p)) {
            return Err(ValidationError::NoAiProviderConfigured);
        }

        if !self.has_key(self.default_provider) {
            return Err(ValidationError::MissingRequired(match self.default_provider {
                Provider::OpenAI => "OPENAI_API_KEY",
                Provider::Gemini => "GOOGLE_API_KEY",
            }));
        }

        if self.allow_list().check(self.default_provider, &self.default_model).is_err() {
            return Err(ValidationError::ModelNotAllowed(self.default_model.clone()));
        }

        if self.max_tokens == 0 || self.max_tokens > MAX_OUTPUT_TOKENS_LIMIT {
            return Err(ValidationError::InvalidMaxTokens(MAX_OUTPUT_TOKENS_LIMIT));
        }

        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }

        if !(1..=10).contains(&self.max_retries) {
            return Err(ValidationError::InvalidRetryCount);
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            google_api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            openai_models: default_openai_models(),
            gemini_models: default_gemini_models(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            base_delay_ms: default_base_delay(),
            openai_base_url: None,
            gemini_base_url: None,
        }
    }
}

fn default_provider() -> Provider {
    Provider::OpenAI
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_models() -> Vec<String> {
    ["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo", "gpt-4o", "gpt-4o-mini", "gpt-5-mini"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_gemini_models() -> Vec<String> {
    ["gemini-pro", "gemini-1.5-flash", "gemini-1.5-pro"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_timeout() -> u64 {
    15
}

fn default_retries() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    500
}
