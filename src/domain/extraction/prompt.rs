//! Prompt assembly for expense extraction.
//!
//! The system message fixes the extractor persona, the rules, the allowed
//! taxonomy, the relative-time lexicon and a few worked examples. The user
//! message carries the current-time anchor and the verbatim input.

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::{json, Value};
use thiserror::Error;

use super::{ExtractionRequest, TemporalResolver};

/// Default ceiling on the combined size of the assembled prompt, in characters.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 16_000;

/// Persona and extraction rules.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a careful expense extractor. You read one short message written in English, Hindi-English or Gujarati-English (including WhatsApp-style spelling) and extract a single expense from it.

## Rules

1. description: copy the ORIGINAL TEXT EXACTLY AS WRITTEN. Do not translate, correct spelling, or normalize it.
2. amount: the numeric value only, as a JSON number. Recognize 'rs', 'rupiya', 'rupees', '₹' and patterns like '20rs', '20 rs', '₹20', '20 rupiya', '20 na'.
3. category and subcategory: choose exactly one of each from the allowed list below, spelled exactly as listed. NEVER invent a category or subcategory that is not listed. If nothing fits, set the field to null and add its name to missing_fields.
4. Gujarati snack words such as 'padika', 'nashto', 'farsan', 'fafda', 'gathiya' belong to a snacks subcategory under food when one is listed.
5. datetime: an ISO-8601 string with a UTC offset. Resolve relative words against the current time given in the user message. If the text has no time reference, use the current time.
6. When you are uncertain about any field, do not guess: return "valid": false, set the uncertain fields to null, and list them in missing_fields. Put a short explanation in reason.
7. Return only one JSON object. No prose, no code fences."#;

/// Assembled chat messages for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system: String,
    pub user: String,
}

impl AssembledPrompt {
    /// Total size in characters.
    pub fn char_count(&self) -> usize {
        self.system.chars().count() + self.user.chars().count()
    }
}

/// The assembled prompt exceeded the configured ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("prompt too large: {actual} characters exceeds {max} limit")]
pub struct PromptTooLargeError {
    pub actual: usize,
    pub max: usize,
}

/// Builds system and user messages for an extraction request.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_prompt_chars: usize,
    resolver: TemporalResolver,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROMPT_CHARS)
    }
}

impl PromptAssembler {
    /// Creates an assembler with the given prompt size ceiling.
    pub fn new(max_prompt_chars: usize) -> Self {
        Self {
            max_prompt_chars,
            resolver: TemporalResolver::new(),
        }
    }

    /// Uses a specific temporal resolver for the lexicon rules.
    pub fn with_resolver(mut self, resolver: TemporalResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn max_prompt_chars(&self) -> usize {
        self.max_prompt_chars
    }

    /// Assembles the prompt, failing if it exceeds the size ceiling.
    ///
    /// User input is never truncated.
    pub fn assemble(&self, request: &ExtractionRequest) -> Result<AssembledPrompt, PromptTooLargeError> {
        let anchor = request.anchor();
        let system = format!(
            "{rules}\n\n## Allowed categories and subcategories\n\n{taxonomy}\n\n\
             ## Relative time words\n\n{temporal}\n\n\
             ## Output format\n\n{schema}\n\n## Examples\n\n{examples}",
            rules = EXTRACTION_SYSTEM_PROMPT,
            taxonomy = request.rendered_taxonomy().text,
            temporal = self.resolver.prompt_rules(),
            schema = OUTPUT_SHAPE,
            examples = few_shot_examples(anchor),
        );
        let user = format!(
            "Current time (IST, ISO-8601): {}\n\nInput: {}",
            anchor.to_rfc3339(),
            request.input_text()
        );

        let prompt = AssembledPrompt { system, user };
        let actual = prompt.char_count();
        if actual > self.max_prompt_chars {
            return Err(PromptTooLargeError {
                actual,
                max: self.max_prompt_chars,
            });
        }
        Ok(prompt)
    }
}

const OUTPUT_SHAPE: &str = r#"{"valid": boolean, "amount": number|null, "category": string|null, "subcategory": string|null, "description": string|null, "datetime": string|null, "missing_fields": [string], "reason": string|null}"#;

fn few_shot_examples(anchor: DateTime<FixedOffset>) -> String {
    let yesterday = anchor - Duration::days(1);
    let examples = [
        (
            "20rs na padika",
            json!({
                "valid": true, "amount": 20, "category": "Food", "subcategory": "Snacks",
                "description": "20rs na padika", "datetime": anchor.to_rfc3339(),
                "missing_fields": [], "reason": null
            }),
        ),
        (
            "kaale bus ma 15 rupiya",
            json!({
                "valid": true, "amount": 15, "category": "Transport", "subcategory": "Bus",
                "description": "kaale bus ma 15 rupiya", "datetime": yesterday.to_rfc3339(),
                "missing_fields": [], "reason": null
            }),
        ),
        (
            "Lunch at SpiceHub yesterday",
            json!({
                "valid": false, "amount": null, "category": "Food", "subcategory": "Dining",
                "description": "Lunch at SpiceHub yesterday", "datetime": yesterday.to_rfc3339(),
                "missing_fields": ["amount"], "reason": "no amount mentioned"
            }),
        ),
    ];

    let mut out = String::from(
        "These examples show the format only; always use the allowed list above.\n",
    );
    for (input, output) in examples {
        out.push_str(&format!("Input: {}\nOutput: {}\n", input, output));
    }
    out.trim_end().to_string()
}

/// JSON schema handed to providers that support schema-constrained output.
pub fn response_schema() -> Value {
    let nullable = |ty: &str| json!({ "type": [ty, "null"] });
    json!({
        "type": "object",
        "properties": {
            "valid": { "type": "boolean" },
            "amount": nullable("number"),
            "category": nullable("string"),
            "subcategory": nullable("string"),
            "description": nullable("string"),
            "datetime": nullable("string"),
            "missing_fields": {
                "type": "array",
                "items": {
                    "type": "string",
                    "enum": ["amount", "category", "subcategory", "description", "datetime"]
                }
            },
            "reason": nullable("string")
        },
        "required": [
            "valid", "amount", "category", "subcategory", "description",
            "datetime", "missing_fields", "reason"
        ],
        "additionalProperties": false
    })
}
