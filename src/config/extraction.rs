//! Extraction pipeline configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::extraction::DEFAULT_MAX_PROMPT_CHARS;

/// Extraction pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum assembled prompt size in characters
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// YAML file holding the taxonomy; in-memory default taxonomy when unset
    pub taxonomy_file: Option<PathBuf>,
}

impl ExtractionConfig {
    /// Validate extraction configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_prompt_chars < 1_000 {
            return Err(ValidationError::InvalidPromptLimit);
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
            taxonomy_file: None,
        }
    }
}

fn default_max_prompt_chars() -> usize {
    DEFAULT_MAX_PROMPT_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExtractionConfig::default();
        assert_eq!(config.max_prompt_chars, DEFAULT_MAX_PROMPT_CHARS);
        assert!(config.taxonomy_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tiny_prompt_limit_is_rejected() {
        let config = ExtractionConfig {
            max_prompt_chars: 10,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidPromptLimit));
    }
}
