//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("No AI provider configured")]
    NoAiProviderConfigured,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Retry attempts must be between 1 and 10")]
    InvalidRetryCount,

    #[error("Max output tokens must be between 1 and {0}")]
    InvalidMaxTokens(u32),

    #[error("Default model '{0}' is not in the allowed model list")]
    ModelNotAllowed(String),

    #[error("Maximum prompt size must be at least 1000 characters")]
    InvalidPromptLimit,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool size must be between 1 and 100")]
    InvalidPoolSize,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}
