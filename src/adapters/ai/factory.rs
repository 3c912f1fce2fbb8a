//! Provider factories.
//!
//! `HttpProviderFactory` builds real HTTP clients from configuration.
//! `StaticProviderFactory` hands out a fixed client, for tests and dry runs.

use secrecy::Secret;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{GeminiConfig, GeminiProvider, OpenAIConfig, OpenAIProvider};
use crate::config::AiConfig;
use crate::domain::extraction::Provider;
use crate::ports::{AIError, AIProvider, ProviderFactory};

/// Builds HTTP-backed provider clients.
#[derive(Debug, Clone, Default)]
pub struct HttpProviderFactory {
    timeout: Option<Duration>,
    openai_base_url: Option<String>,
    gemini_base_url: Option<String>,
}

impl HttpProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes timeout and base URL overrides from configuration.
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            timeout: Some(config.timeout()),
            openai_base_url: config.openai_base_url.clone(),
            gemini_base_url: config.gemini_base_url.clone(),
        }
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(
        &self,
        provider: Provider,
        model: &str,
        api_key: Secret<String>,
    ) -> Result<Arc<dyn AIProvider>, AIError> {
        match provider {
            Provider::OpenAI => {
                let mut config = OpenAIConfig::new(api_key).with_model(model);
                if let Some(timeout) = self.timeout {
                    config = config.with_timeout(timeout);
                }
                if let Some(ref url) = self.openai_base_url {
                    config = config.with_base_url(url.clone());
                }
                Ok(Arc::new(OpenAIProvider::new(config)?))
            }
            Provider::Gemini => {
                let mut config = GeminiConfig::new(api_key).with_model(model);
                if let Some(timeout) = self.timeout {
                    config = config.with_timeout(timeout);
                }
                if let Some(ref url) = self.gemini_base_url {
                    config = config.with_base_url(url.clone());
                }
                Ok(Arc::new(GeminiProvider::new(config)?))
            }
        }
    }
}

/// Returns the same client for every request and records what was asked for.
pub struct StaticProviderFactory {
    client: Arc<dyn AIProvider>,
    created: Mutex<Vec<(Provider, String)>>,
}

impl StaticProviderFactory {
    pub fn new(client: Arc<dyn AIProvider>) -> Self {
        Self {
            client,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Provider/model pairs passed to `create`, in order.
    pub fn created(&self) -> Vec<(Provider, String)> {
        self.created
            .lock()
            .map(|created| created.clone())
            .unwrap_or_default()
    }
}

impl ProviderFactory for StaticProviderFactory {
    fn create(
        &self,
        provider: Provider,
        model: &str,
        _api_key: Secret<String>,
    ) -> Result<Arc<dyn AIProvider>, AIError> {
        if let Ok(mut created) = self.created.lock() {
            created.push((provider, model.to_string()));
        }
        Ok(Arc::clone(&self.client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;

    fn key() -> Secret<String> {
        Secret::new("test-key".to_string())
    }

    #[test]
    fn http_factory_builds_client_for_each_provider() {
        let factory = HttpProviderFactory::new();

        let openai = factory.create(Provider::OpenAI, "gpt-4o-mini", key()).unwrap();
        assert_eq!(openai.provider_info().name, "openai");
        assert_eq!(openai.provider_info().model, "gpt-4o-mini");

        let gemini = factory.create(Provider::Gemini, "gemini-1.5-flash", key()).unwrap();
        assert_eq!(gemini.provider_info().name, "gemini");
    }

    #[test]
    fn static_factory_records_requests() {
        let factory = StaticProviderFactory::new(Arc::new(MockAIProvider::new()));

        factory.create(Provider::Gemini, "gemini-1.5-flash", key()).unwrap();

        assert_eq!(
            factory.created(),
            vec![(Provider::Gemini, "gemini-1.5-flash".to_string())]
        );
    }
}
