//! In-memory settings store.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::extraction::AiSettings;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::SettingsStore;

/// AI settings held in memory.
pub struct InMemorySettingsStore {
    settings: RwLock<Option<AiSettings>>,
}

impl InMemorySettingsStore {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            settings: RwLock::new(Some(settings)),
        }
    }

    /// A store with no settings; reads fail.
    pub fn empty() -> Self {
        Self {
            settings: RwLock::new(None),
        }
    }

    pub fn update(&self, settings: AiSettings) {
        if let Ok(mut current) = self.settings.write() {
            *current = Some(settings);
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get_ai_settings(&self) -> Result<AiSettings, DomainError> {
        self.settings
            .read()
            .ok()
            .and_then(|s| s.clone())
            .ok_or_else(|| DomainError::new(ErrorCode::SettingsUnavailable, "no AI settings configured"))
    }
}
