//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `EXPENSE_EXTRACTOR` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use expense_extractor::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Default model: {}", config.ai.default_model);
//! ```

mod ai;
mod database;
mod error;
mod extraction;
mod logging;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use extraction::ExtractionConfig;
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// AI provider configuration (OpenAI/Gemini)
    #[serde(default)]
    pub ai: AiConfig,

    /// Extraction pipeline configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// PostgreSQL record store; in-memory store when absent
    pub database: Option<DatabaseConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `EXPENSE_EXTRACTOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Splits the model allow-lists on commas
    /// 5. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `EXPENSE_EXTRACTOR__AI__OPENAI_API_KEY=sk-...` -> `ai.openai_api_key`
    /// - `EXPENSE_EXTRACTOR__AI__GEMINI_MODELS=gemini-1.5-flash,gemini-1.5-pro`
    /// - `EXPENSE_EXTRACTOR__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("EXPENSE_EXTRACTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ai.openai_models")
                    .with_list_parse_key("ai.gemini_models"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.extraction.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extraction::Provider;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "EXPENSE_EXTRACTOR__AI__OPENAI_API_KEY",
        "EXPENSE_EXTRACTOR__AI__GOOGLE_API_KEY",
        "EXPENSE_EXTRACTOR__AI__DEFAULT_PROVIDER",
        "EXPENSE_EXTRACTOR__AI__DEFAULT_MODEL",
        "EXPENSE_EXTRACTOR__AI__GEMINI_MODELS",
        "EXPENSE_EXTRACTOR__DATABASE__URL",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("EXPENSE_EXTRACTOR__AI__OPENAI_API_KEY", "sk-test");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.ai.has_key(Provider::OpenAI));
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_and_model_lists_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("EXPENSE_EXTRACTOR__AI__GOOGLE_API_KEY", "g-test");
        env::set_var("EXPENSE_EXTRACTOR__AI__DEFAULT_PROVIDER", "gemini");
        env::set_var("EXPENSE_EXTRACTOR__AI__DEFAULT_MODEL", "gemini-2.0-flash");
        env::set_var("EXPENSE_EXTRACTOR__AI__GEMINI_MODELS", "gemini-1.5-flash,gemini-2.0-flash");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.default_provider, Provider::Gemini);
        assert_eq!(config.ai.gemini_models, vec!["gemini-1.5-flash", "gemini-2.0-flash"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_section_is_validated() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("EXPENSE_EXTRACTOR__AI__OPENAI_API_KEY", "sk-test");
        env::set_var("EXPENSE_EXTRACTOR__DATABASE__URL", "mysql://localhost/x");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.validate(), Err(ValidationError::InvalidDatabaseUrl));
    }
}
