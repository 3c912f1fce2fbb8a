//! ExtractionRequest - immutable description of one extraction attempt.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::Provider;
use crate::domain::foundation::ValidationError;
use crate::domain::taxonomy::{RenderedTaxonomy, TaxonomySnapshot, TaxonomySource};

/// Sampling temperature used for every model call.
pub const DETERMINISTIC_TEMPERATURE: f32 = 0.0;

/// Upper bound accepted for the max-output-token budget.
pub const MAX_OUTPUT_TOKENS_LIMIT: u32 = 4096;

/// Provider/model/generation settings supplied by the settings store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    pub provider: Provider,
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AiSettings {
    /// Creates settings with temperature 0.0.
    pub fn new(provider: Provider, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DETERMINISTIC_TEMPERATURE,
            max_tokens,
        }
    }

    /// Checks field ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::empty_field("model"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                "temperature",
                0.0,
                2.0,
                f64::from(self.temperature),
            ));
        }
        if self.max_tokens == 0 || self.max_tokens > MAX_OUTPUT_TOKENS_LIMIT {
            return Err(ValidationError::out_of_range(
                "max_tokens",
                1.0,
                f64::from(MAX_OUTPUT_TOKENS_LIMIT),
                f64::from(self.max_tokens),
            ));
        }
        Ok(())
    }
}

/// Settings recorded alongside every attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub provider: Provider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub taxonomy_version: String,
    pub taxonomy_source: TaxonomySource,
}

impl SettingsSnapshot {
    /// Captures the settings an attempt runs with; temperature is always 0.0.
    pub fn capture(settings: &AiSettings, taxonomy: &RenderedTaxonomy) -> Self {
        Self {
            provider: settings.provider,
            model: settings.model.trim().to_string(),
            temperature: DETERMINISTIC_TEMPERATURE,
            max_tokens: settings.max_tokens,
            taxonomy_version: taxonomy.snapshot.version(),
            taxonomy_source: taxonomy.source,
        }
    }
}

/// Everything one extraction attempt needs, fixed at construction.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    input_text: String,
    provider: Provider,
    model: String,
    temperature: f32,
    max_tokens: u32,
    taxonomy: RenderedTaxonomy,
    anchor: DateTime<FixedOffset>,
}

impl ExtractionRequest {
    /// Builds a request.
    ///
    /// The input text is kept verbatim but must contain a non-whitespace
    /// character. The temperature is always 0.0, whatever the settings say.
    pub fn new(
        input_text: impl Into<String>,
        settings: &AiSettings,
        taxonomy: RenderedTaxonomy,
        anchor: DateTime<FixedOffset>,
    ) -> Result<Self, ValidationError> {
        let input_text = input_text.into();
        if input_text.trim().is_empty() {
            return Err(ValidationError::empty_field("input_text"));
        }
        settings.validate()?;

        Ok(Self {
            input_text,
            provider: settings.provider,
            model: settings.model.trim().to_string(),
            temperature: DETERMINISTIC_TEMPERATURE,
            max_tokens: settings.max_tokens,
            taxonomy,
            anchor,
        })
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// The effective taxonomy snapshot for this attempt.
    pub fn taxonomy(&self) -> &TaxonomySnapshot {
        &self.taxonomy.snapshot
    }

    /// The rendered taxonomy and its source.
    pub fn rendered_taxonomy(&self) -> &RenderedTaxonomy {
        &self.taxonomy
    }

    /// Current time in the resolution timezone.
    pub fn anchor(&self) -> DateTime<FixedOffset> {
        self.anchor
    }

    /// Settings to record with the attempt.
    pub fn settings_snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            provider: self.provider,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            taxonomy_version: self.taxonomy.snapshot.version(),
            taxonomy_source: self.taxonomy.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::taxonomy::TaxonomyFormatter;

    fn anchor() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-10T18:45:00+05:30").unwrap()
    }

    fn settings() -> AiSettings {
        AiSettings::new(Provider::OpenAI, "gpt-4o-mini", 512)
    }

    #[test]
    fn rejects_blank_input() {
        let taxonomy = TaxonomyFormatter::prepare(TaxonomySnapshot::new());
        let err = ExtractionRequest::new("   ", &settings(), taxonomy, anchor()).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("input_text"));
    }

    #[test]
    fn keeps_input_verbatim_and_forces_zero_temperature() {
        let mut settings = settings();
        settings.temperature = 0.7;
        let taxonomy = TaxonomyFormatter::prepare(TaxonomySnapshot::new());

        let request = ExtractionRequest::new("  20rs na padika ", &settings, taxonomy, anchor()).unwrap();
        assert_eq!(request.input_text(), "  20rs na padika ");
        assert_eq!(request.temperature(), 0.0);
    }

    #[test]
    fn settings_snapshot_records_taxonomy_source_and_version() {
        let taxonomy = TaxonomyFormatter::prepare(TaxonomySnapshot::new());
        let request = ExtractionRequest::new("chai 10", &settings(), taxonomy, anchor()).unwrap();

        let snapshot = request.settings_snapshot();
        assert_eq!(snapshot.taxonomy_source, TaxonomySource::Default);
        assert_eq!(snapshot.taxonomy_version, TaxonomySnapshot::minimal_default().version());
        assert_eq!(snapshot.max_tokens, 512);
    }

    #[test]
    fn settings_validation_bounds_max_tokens() {
        let mut settings = settings();
        settings.max_tokens = 0;
        assert!(settings.validate().is_err());

        settings.max_tokens = MAX_OUTPUT_TOKENS_LIMIT + 1;
        assert!(settings.validate().is_err());

        settings.max_tokens = MAX_OUTPUT_TOKENS_LIMIT;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn settings_validation_rejects_blank_model() {
        let settings = AiSettings::new(Provider::Gemini, " ", 100);
        assert_eq!(settings.validate(), Err(ValidationError::empty_field("model")));
    }
}
