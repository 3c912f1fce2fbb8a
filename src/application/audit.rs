//! AuditRecorder - packages every attempt for the record store.

use std::sync::Arc;

use super::invoker::Invocation;
use crate::domain::extraction::{ExtractionAttemptLog, ExtractionResult, ParsePath, SettingsSnapshot};
use crate::domain::foundation::{AttemptLogId, DomainError};
use crate::ports::{Clock, RecordStore};

/// What an attempt produced, borrowed for packaging.
#[derive(Debug, Clone)]
pub struct AttemptRecord<'a> {
    pub input_text: &'a str,
    pub settings: SettingsSnapshot,
    pub invocation: Option<&'a Invocation>,
    /// Provider text from a call that returned no usable payload.
    pub raw_output: Option<&'a str>,
    pub parse_path: Option<ParsePath>,
    pub result: &'a ExtractionResult,
    pub low_confidence_datetime: bool,
    pub error: Option<String>,
}

impl<'a> AttemptRecord<'a> {
    pub fn new(input_text: &'a str, settings: SettingsSnapshot, result: &'a ExtractionResult) -> Self {
        Self {
            input_text,
            settings,
            invocation: None,
            raw_output: None,
            parse_path: None,
            result,
            low_confidence_datetime: false,
            error: None,
        }
    }
}

/// Writes one append-only log entry per attempt.
pub struct AuditRecorder {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Builds the log entry for an attempt.
    pub fn package(&self, record: AttemptRecord<'_>) -> ExtractionAttemptLog {
        let mut log = ExtractionAttemptLog::new(
            record.input_text,
            record.settings,
            record.result.clone(),
            self.clock.now(),
        )
        .with_low_confidence_datetime(record.low_confidence_datetime);

        if let Some(invocation) = record.invocation {
            let path = record.parse_path.unwrap_or(ParsePath::Unparseable);
            log = log.with_raw_output(invocation.raw_output.clone(), path).with_invocation(
                invocation.latency.as_millis() as u64,
                invocation.usage.map(|u| u.prompt_tokens),
                invocation.usage.map(|u| u.completion_tokens),
            );
        } else if let Some(raw) = record.raw_output {
            let path = record.parse_path.unwrap_or(ParsePath::Unparseable);
            log = log.with_raw_output(raw, path);
        }
        if let Some(error) = record.error {
            log = log.with_error(error);
        }
        log
    }

    /// Packages and persists an attempt.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` when the record store rejects the entry
    pub async fn log_attempt(&self, record: AttemptRecord<'_>) -> Result<AttemptLogId, DomainError> {
        let log = self.package(record);
        match self.store.log_attempt(&log).await {
            Ok(id) => {
                tracing::debug!(attempt_log_id = %id, valid = log.result.valid, "attempt logged");
                Ok(id)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to log extraction attempt");
                Err(err)
            }
        }
    }
}
