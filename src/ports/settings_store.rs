//! Settings store port.

use crate::domain::extraction::AiSettings;
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Supplies provider, model and generation settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the current AI settings.
    ///
    /// # Errors
    ///
    /// - `SettingsUnavailable` when settings cannot be read
    async fn get_ai_settings(&self) -> Result<AiSettings, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn SettingsStore) {}
    }
}
