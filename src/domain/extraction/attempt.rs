//! ExtractionAttemptLog - write-once audit entry for one attempt.

use serde::{Deserialize, Serialize};

use super::{ExtractionResult, ParsePath, Provider, SettingsSnapshot};
use crate::domain::foundation::{AttemptLogId, Timestamp};

/// Everything known about one extraction attempt, success or failure.
///
/// Built once by the audit recorder and handed to the record store. Never
/// updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionAttemptLog {
    pub id: AttemptLogId,
    /// Input exactly as the caller supplied it.
    pub input_text: String,
    pub settings: SettingsSnapshot,
    /// Unparsed provider payload, absent when no call completed.
    pub raw_output: Option<String>,
    pub parse_path: Option<ParsePath>,
    pub result: ExtractionResult,
    /// Set when an ambiguous relative-day word was resolved to the past by default.
    pub low_confidence_datetime: bool,
    pub latency_ms: Option<u64>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    /// Pipeline error that ended the attempt, if any.
    pub error: Option<String>,
    pub created_at: Timestamp,
}

impl ExtractionAttemptLog {
    pub fn new(
        input_text: impl Into<String>,
        settings: SettingsSnapshot,
        result: ExtractionResult,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: AttemptLogId::new(),
            input_text: input_text.into(),
            settings,
            raw_output: None,
            parse_path: None,
            result,
            low_confidence_datetime: false,
            latency_ms: None,
            prompt_tokens: None,
            completion_tokens: None,
            error: None,
            created_at,
        }
    }

    pub fn with_raw_output(mut self, raw: impl Into<String>, path: ParsePath) -> Self {
        self.raw_output = Some(raw.into());
        self.parse_path = Some(path);
        self
    }

    /// Records call latency and token counts reported by the provider.
    pub fn with_invocation(mut self, latency_ms: u64, prompt_tokens: Option<u32>, completion_tokens: Option<u32>) -> Self {
        self.latency_ms = Some(latency_ms);
        self.prompt_tokens = prompt_tokens;
        self.completion_tokens = completion_tokens;
        self
    }

    pub fn with_low_confidence_datetime(mut self, flag: bool) -> Self {
        self.low_confidence_datetime = flag;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn provider(&self) -> Provider {
        self.settings.provider
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extraction::AiSettings;
    use crate::domain::taxonomy::{TaxonomyFormatter, TaxonomySnapshot, TaxonomySource};

    fn settings() -> SettingsSnapshot {
        let taxonomy = TaxonomyFormatter::prepare(TaxonomySnapshot::new());
        SettingsSnapshot::capture(&AiSettings::new(Provider::Gemini, "gemini-1.5-flash", 256), &taxonomy)
    }

    #[test]
    fn new_log_has_no_invocation_details() {
        let log = ExtractionAttemptLog::new("chai", settings(), ExtractionResult::failed("x"), Timestamp::now());

        assert_eq!(log.raw_output, None);
        assert_eq!(log.parse_path, None);
        assert_eq!(log.latency_ms, None);
        assert!(!log.low_confidence_datetime);
        assert_eq!(log.provider(), Provider::Gemini);
        assert_eq!(log.model(), "gemini-1.5-flash");
        assert_eq!(log.settings.taxonomy_source, TaxonomySource::Default);
    }

    #[test]
    fn builders_record_invocation() {
        let log = ExtractionAttemptLog::new("chai 10", settings(), ExtractionResult::empty(), Timestamp::now())
            .with_raw_output("{}", ParsePath::Fallback)
            .with_invocation(420, Some(310), None)
            .with_low_confidence_datetime(true);

        assert_eq!(log.raw_output.as_deref(), Some("{}"));
        assert_eq!(log.parse_path, Some(ParsePath::Fallback));
        assert_eq!(log.latency_ms, Some(420));
        assert_eq!(log.prompt_tokens, Some(310));
        assert!(log.low_confidence_datetime);
    }

    #[test]
    fn serializes_settings_snapshot() {
        let log = ExtractionAttemptLog::new("chai", settings(), ExtractionResult::empty(), Timestamp::now());
        let json = serde_json::to_value(&log).unwrap();

        assert_eq!(json["settings"]["temperature"], 0.0);
        assert_eq!(json["settings"]["taxonomy_source"], "default");
        assert_eq!(json["settings"]["provider"], "gemini");
    }
}
