//! Extraction module - the natural-language expense extraction pipeline.
//!
//! Stages, in order: temporal anchoring, prompt assembly (with the rendered
//! taxonomy), result parsing, and validation. Provider calls and audit
//! logging live in the application layer.

mod attempt;
mod field;
mod parser;
mod prompt;
mod provider;
mod request;
mod result;
mod temporal;
mod validator;

pub use attempt::ExtractionAttemptLog;
pub use field::ExtractionField;
pub use parser::{ParsePath, ParsedOutput, ResultParser};
pub use prompt::{
    response_schema, AssembledPrompt, PromptAssembler, PromptTooLargeError, DEFAULT_MAX_PROMPT_CHARS,
    EXTRACTION_SYSTEM_PROMPT,
};
pub use provider::{ModelAllowList, Provider, ProviderCapabilities};
pub use request::{AiSettings, ExtractionRequest, SettingsSnapshot, DETERMINISTIC_TEMPERATURE, MAX_OUTPUT_TOKENS_LIMIT};
pub use result::{ExtractionResult, UNPARSEABLE_REASON};
pub use temporal::{ist, Language, RelativeDay, RelativeTimeToken, TemporalResolver, IST_OFFSET_SECS};
pub use validator::Validator;
