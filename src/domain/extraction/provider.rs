//! Closed set of language-model providers and their capabilities.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Supported language-model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Gemini,
}

/// What a provider can do beyond plain text completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Output can be constrained to a JSON schema by the provider.
    pub supports_structured_output: bool,
}

impl Provider {
    /// All providers, in display order.
    pub const ALL: [Provider; 2] = [Provider::OpenAI, Provider::Gemini];

    /// Returns the capability record for this provider.
    pub fn capabilities(&self) -> ProviderCapabilities {
        match self {
            Provider::OpenAI => ProviderCapabilities {
                supports_structured_output: true,
            },
            Provider::Gemini => ProviderCapabilities {
                supports_structured_output: false,
            },
        }
    }

    /// Stable lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "gemini" => Ok(Provider::Gemini),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unsupported provider '{}'", other),
            )),
        }
    }
}

/// Model ids each provider is allowed to use.
///
/// A provider with no entry accepts any model id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelAllowList {
    models: HashMap<Provider, Vec<String>>,
}

impl ModelAllowList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts `provider` to the given model ids.
    pub fn with_models<I, S>(mut self, provider: Provider, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models = models
            .into_iter()
            .map(|m| m.into().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        self.models.insert(provider, models);
        self
    }

    /// Models listed for `provider`, empty when unrestricted.
    pub fn models(&self, provider: Provider) -> &[String] {
        self.models.get(&provider).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Checks a provider/model pair.
    pub fn check(&self, provider: Provider, model: &str) -> Result<(), ValidationError> {
        match self.models.get(&provider) {
            Some(allowed) if !allowed.iter().any(|m| m == model.trim()) => {
                Err(ValidationError::invalid_format(
                    "model",
                    format!("'{}' is not an allowed {} model", model.trim(), provider),
                ))
            }
            _ => Ok(()),
        }
    }
}
