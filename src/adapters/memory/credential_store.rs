//! In-memory credential store.

use secrecy::Secret;
use std::collections::HashMap;

use crate::config::AiConfig;
use crate::domain::extraction::Provider;
use crate::ports::CredentialStore;

/// API keys held in memory, typically loaded from configuration.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    keys: HashMap<Provider, Secret<String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key for `provider`. Blank keys are ignored.
    pub fn with_key(mut self, provider: Provider, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.keys.insert(provider, Secret::new(key));
        }
        self
    }

    /// Loads the configured provider keys.
    pub fn from_config(config: &AiConfig) -> Self {
        let mut keys = HashMap::new();
        for provider in Provider::ALL {
            if let Some(key) = config.api_key(provider) {
                keys.insert(provider, key);
            }
        }
        Self { keys }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn api_key(&self, provider: Provider) -> Option<Secret<String>> {
        self.keys.get(&provider).cloned()
    }
}
