//! ExtractExpenseHandler - runs one extraction attempt end to end.
//!
//! Flow: resolve anchor and taxonomy, check configuration, assemble the
//! prompt, invoke the model, parse, validate, log the attempt, and save the
//! expense when the result is valid. Every call to `extract` writes exactly
//! one attempt log entry, whichever way it ends.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::audit::{AttemptRecord, AuditRecorder};
use crate::application::invoker::{InvocationError, ModelInvoker};
use crate::config::AppConfig;
use crate::domain::expense::ExpenseRecord;
use crate::domain::extraction::{
    AiSettings, ExtractionRequest, ExtractionResult, ModelAllowList, ParsePath, PromptAssembler,
    PromptTooLargeError, ResultParser, SettingsSnapshot, TemporalResolver, Validator,
    DEFAULT_MAX_PROMPT_CHARS,
};
use crate::domain::foundation::{AttemptLogId, ExpenseId};
use crate::domain::taxonomy::{TaxonomyFormatter, TaxonomySnapshot, TaxonomySource};
use crate::ports::{
    AIError, Clock, CredentialStore, ProviderFactory, RecordStore, SettingsStore, SystemClock,
    TaxonomyStore,
};

/// What the caller gets back from a completed attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    pub result: ExtractionResult,
    pub attempt_log_id: AttemptLogId,
    /// Present only when the result was valid and the expense was saved.
    pub expense_id: Option<ExpenseId>,
    pub parse_path: ParsePath,
    /// An ambiguous relative-day word was present and resolved by default.
    pub low_confidence_datetime: bool,
}

/// Failures surfaced to the caller.
///
/// Everything except `Persistence` means the extraction itself failed and
/// the user should edit the input or fix settings. `Persistence` means the
/// extraction completed but was not durably recorded; the result it carries
/// can be saved again without re-running the model.
#[derive(Debug, Clone, Error)]
pub enum ExtractExpenseError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    PromptTooLarge(#[from] PromptTooLargeError),

    #[error("provider unavailable after {attempts} attempt(s): {message}")]
    ProviderUnavailable { attempts: u32, message: String },

    #[error("provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("extraction not recorded: {message}")]
    Persistence {
        result: Box<ExtractionResult>,
        attempt_log_id: Option<AttemptLogId>,
        message: String,
    },
}

impl ExtractExpenseError {
    /// True when extraction finished but its records were not written.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

/// Tunables for the handler.
#[derive(Debug, Clone)]
pub struct ExtractExpenseConfig {
    pub max_prompt_chars: usize,
    pub allowed_models: ModelAllowList,
}

impl Default for ExtractExpenseConfig {
    fn default() -> Self {
        Self {
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            allowed_models: ModelAllowList::new(),
        }
    }
}

impl ExtractExpenseConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_prompt_chars: config.extraction.max_prompt_chars,
            allowed_models: config.ai.allow_list(),
        }
    }
}

/// Handler for expense extraction.
pub struct ExtractExpenseHandler {
    providers: Arc<dyn ProviderFactory>,
    credentials: Arc<dyn CredentialStore>,
    taxonomy_store: Arc<dyn TaxonomyStore>,
    settings_store: Arc<dyn SettingsStore>,
    records: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    recorder: AuditRecorder,
    invoker: ModelInvoker,
    config: ExtractExpenseConfig,
    resolver: TemporalResolver,
    assembler: PromptAssembler,
    parser: ResultParser,
    validator: Validator,
}

impl ExtractExpenseHandler {
    pub fn new(
        providers: Arc<dyn ProviderFactory>,
        credentials: Arc<dyn CredentialStore>,
        taxonomy_store: Arc<dyn TaxonomyStore>,
        settings_store: Arc<dyn SettingsStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let resolver = TemporalResolver::new();
        let config = ExtractExpenseConfig::default();
        Self {
            providers,
            credentials,
            taxonomy_store,
            settings_store,
            recorder: AuditRecorder::new(Arc::clone(&records), Arc::clone(&clock)),
            records,
            clock,
            invoker: ModelInvoker::default(),
            assembler: PromptAssembler::new(config.max_prompt_chars).with_resolver(resolver),
            config,
            resolver,
            parser: ResultParser::new(resolver),
            validator: Validator::new(resolver),
        }
    }

    /// Replaces the clock used for anchors and log timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.recorder = AuditRecorder::new(Arc::clone(&self.records), Arc::clone(&clock));
        self.clock = clock;
        self
    }

    pub fn with_invoker(mut self, invoker: ModelInvoker) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn with_config(mut self, config: ExtractExpenseConfig) -> Self {
        self.assembler = PromptAssembler::new(config.max_prompt_chars).with_resolver(self.resolver);
        self.config = config;
        self
    }

    /// Reads settings and taxonomy from the stores, then runs [`Self::extract`].
    ///
    /// An unreadable taxonomy degrades to the default taxonomy. Unreadable
    /// settings are a configuration error; no attempt is logged because no
    /// attempt was started.
    pub async fn extract_with_stores(
        &self,
        input_text: &str,
    ) -> Result<ExtractionOutcome, ExtractExpenseError> {
        let settings = self.settings_store.get_ai_settings().await.map_err(|err| {
            tracing::error!(error = %err, "settings store unavailable");
            ExtractExpenseError::Configuration(format!("settings unavailable: {}", err))
        })?;

        let taxonomy = match self.taxonomy_store.get_taxonomy().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "taxonomy store unavailable, using default taxonomy");
                TaxonomySnapshot::new()
            }
        };

        self.extract(input_text, &settings, taxonomy).await
    }

    /// Extracts an expense from `input_text`, constrained to `taxonomy`.
    pub async fn extract(
        &self,
        input_text: &str,
        settings: &AiSettings,
        taxonomy: TaxonomySnapshot,
    ) -> Result<ExtractionOutcome, ExtractExpenseError> {
        let trace_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "extract_expense",
            trace_id = %trace_id,
            provider = %settings.provider,
            model = %settings.model,
        );
        self.run(input_text, settings, taxonomy, &trace_id)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        input_text: &str,
        settings: &AiSettings,
        taxonomy: TaxonomySnapshot,
        trace_id: &str,
    ) -> Result<ExtractionOutcome, ExtractExpenseError> {
        // 1. Fix the anchor and taxonomy for the whole attempt
        let anchor = self.resolver.anchor(self.clock.now());
        let rendered = TaxonomyFormatter::prepare(taxonomy);
        if rendered.source == TaxonomySource::Default {
            tracing::debug!("taxonomy empty, using default taxonomy");
        }
        let snapshot = SettingsSnapshot::capture(settings, &rendered);

        // 2. Reject what cannot be sent before any provider call
        if input_text.trim().is_empty() {
            return Err(self
                .reject(
                    input_text,
                    snapshot,
                    ExtractExpenseError::InvalidInput("input text is empty".to_string()),
                )
                .await);
        }

        let model = settings.model.trim();
        let configured = settings
            .validate()
            .and_then(|_| self.config.allowed_models.check(settings.provider, model))
            .map_err(|err| ExtractExpenseError::Configuration(err.to_string()));
        if let Err(error) = configured {
            return Err(self.reject(input_text, snapshot, error).await);
        }

        let Some(api_key) = self.credentials.api_key(settings.provider) else {
            let error = ExtractExpenseError::Configuration(format!(
                "no API key configured for provider '{}'",
                settings.provider
            ));
            return Err(self.reject(input_text, snapshot, error).await);
        };

        let client = match self.providers.create(settings.provider, model, api_key) {
            Ok(client) => client,
            Err(err) => {
                let error = ExtractExpenseError::Configuration(err.to_string());
                return Err(self.reject(input_text, snapshot, error).await);
            }
        };

        let request = match ExtractionRequest::new(input_text, settings, rendered, anchor) {
            Ok(request) => request,
            Err(err) => {
                let error = ExtractExpenseError::InvalidInput(err.to_string());
                return Err(self.reject(input_text, snapshot, error).await);
            }
        };

        // 3. Assemble and invoke
        let prompt = match self.assembler.assemble(&request) {
            Ok(prompt) => prompt,
            Err(err) => {
                tracing::warn!(actual = err.actual, max = err.max, "prompt too large");
                return Err(self.reject(input_text, snapshot, err.into()).await);
            }
        };

        let invocation = match self
            .invoker
            .invoke(client.as_ref(), &request, &prompt, trace_id)
            .await
        {
            Ok(invocation) => invocation,
            Err(InvocationError {
                error: AIError::ContentFiltered { reason },
                attempts,
            }) => {
                tracing::warn!(%reason, attempts, "model refused to extract");
                return self
                    .refused(input_text, snapshot, &request, &reason, anchor)
                    .await;
            }
            Err(failure) => {
                let error = if failure.error.is_configuration() {
                    ExtractExpenseError::Configuration(failure.error.to_string())
                } else if failure.error.is_retryable() {
                    ExtractExpenseError::ProviderUnavailable {
                        attempts: failure.attempts,
                        message: failure.error.to_string(),
                    }
                } else {
                    ExtractExpenseError::ProviderRejected(failure.error.to_string())
                };
                tracing::warn!(error = %error, attempts = failure.attempts, "provider call failed");
                return Err(self.reject(input_text, snapshot, error).await);
            }
        };

        // 4. Parse and validate
        let parsed = self
            .parser
            .parse(&invocation.raw_output, invocation.structured, anchor);
        let result = self
            .validator
            .validate(parsed.result, request.taxonomy(), anchor);

        let low_confidence_datetime =
            match self.resolver.past_default(input_text, result.datetime, anchor) {
                Some(token) => {
                    tracing::warn!(
                        word = token.word,
                        datetime = ?result.datetime,
                        "ambiguous relative day resolved to the most recent past"
                    );
                    true
                }
                None => false,
            };

        tracing::info!(
            valid = result.valid,
            parse_path = %parsed.path,
            missing = ?result.missing_fields,
            "extraction validated"
        );

        // 5. Log the attempt, then persist the expense
        let mut record = AttemptRecord::new(input_text, snapshot, &result);
        record.invocation = Some(&invocation);
        record.parse_path = Some(parsed.path);
        record.low_confidence_datetime = low_confidence_datetime;

        let attempt_log_id = match self.recorder.log_attempt(record).await {
            Ok(id) => id,
            Err(err) => {
                return Err(ExtractExpenseError::Persistence {
                    result: Box::new(result),
                    attempt_log_id: None,
                    message: format!("attempt log not written: {}", err),
                });
            }
        };

        let expense_id = if result.valid {
            Some(
                self.save_expense(&result, input_text, &request, attempt_log_id)
                    .await?,
            )
        } else {
            None
        };

        Ok(ExtractionOutcome {
            result,
            attempt_log_id,
            expense_id,
            parse_path: parsed.path,
            low_confidence_datetime,
        })
    }

    async fn save_expense(
        &self,
        result: &ExtractionResult,
        input_text: &str,
        request: &ExtractionRequest,
        attempt_log_id: AttemptLogId,
    ) -> Result<ExpenseId, ExtractExpenseError> {
        let persistence = |message: String| ExtractExpenseError::Persistence {
            result: Box::new(result.clone()),
            attempt_log_id: Some(attempt_log_id),
            message,
        };

        let expense = ExpenseRecord::from_valid(
            result,
            input_text,
            request.provider(),
            request.model(),
            attempt_log_id,
            self.clock.now(),
        )
        .map_err(|err| persistence(format!("expense not built: {}", err)))?;

        match self.records.save_expense(&expense).await {
            Ok(id) => {
                tracing::info!(expense_id = %id, %attempt_log_id, "expense saved");
                Ok(id)
            }
            Err(err) => {
                tracing::error!(error = %err, %attempt_log_id, "failed to save expense");
                Err(persistence(format!("expense not saved: {}", err)))
            }
        }
    }

    /// Turns a refusal into an invalid result carrying the refusal text.
    ///
    /// The refusal is model output, so it is validated and logged like any
    /// other payload instead of failing the attempt.
    async fn refused(
        &self,
        input_text: &str,
        snapshot: SettingsSnapshot,
        request: &ExtractionRequest,
        refusal: &str,
        anchor: DateTime<FixedOffset>,
    ) -> Result<ExtractionOutcome, ExtractExpenseError> {
        let reason = if refusal.trim().is_empty() {
            "model refused to extract".to_string()
        } else {
            refusal.to_string()
        };
        let result = self
            .validator
            .validate(ExtractionResult::failed(reason), request.taxonomy(), anchor);

        let mut record = AttemptRecord::new(input_text, snapshot, &result);
        record.raw_output = Some(refusal);
        record.parse_path = Some(ParsePath::Unparseable);

        let attempt_log_id = self.recorder.log_attempt(record).await.map_err(|err| {
            ExtractExpenseError::Persistence {
                result: Box::new(result.clone()),
                attempt_log_id: None,
                message: format!("attempt log not written: {}", err),
            }
        })?;

        Ok(ExtractionOutcome {
            result,
            attempt_log_id,
            expense_id: None,
            parse_path: ParsePath::Unparseable,
            low_confidence_datetime: false,
        })
    }

    /// Logs an attempt that ended before a result was produced.
    async fn reject(
        &self,
        input_text: &str,
        settings: SettingsSnapshot,
        error: ExtractExpenseError,
    ) -> ExtractExpenseError {
        let message = error.to_string();
        let result = ExtractionResult::failed(message.clone());
        let mut record = AttemptRecord::new(input_text, settings, &result);
        record.error = Some(message);

        if self.recorder.log_attempt(record).await.is_err() {
            tracing::warn!(error = %error, "failed attempt was not recorded");
        }
        error
    }
}
