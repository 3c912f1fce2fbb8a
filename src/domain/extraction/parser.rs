//! Structured result parser.
//!
//! Schema-constrained providers return a JSON object that is deserialized
//! directly. Free-text providers, or structured output that fails to
//! deserialize, go through the fallback path: the first syntactically valid
//! JSON object is located in the text (ignoring prose and code fences,
//! repairing trailing commas) and its fields are coerced leniently.
//!
//! Parsing never fails. Output with no JSON object becomes
//! [`ExtractionResult::unparseable`].

use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ExtractionField, ExtractionResult, TemporalResolver};

/// Which parse path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePath {
    Structured,
    Fallback,
    Unparseable,
}

impl ParsePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Fallback => "fallback",
            Self::Unparseable => "unparseable",
        }
    }
}

impl std::fmt::Display for ParsePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate result plus the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub result: ExtractionResult,
    pub path: ParsePath,
}

/// Exact shape returned by schema-constrained providers.
#[derive(Debug, Deserialize)]
struct StructuredPayload {
    valid: bool,
    amount: Option<f64>,
    category: Option<String>,
    subcategory: Option<String>,
    description: Option<String>,
    datetime: Option<String>,
    #[serde(default)]
    missing_fields: Vec<String>,
    reason: Option<String>,
}

/// Converts raw model output into a candidate [`ExtractionResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultParser {
    resolver: TemporalResolver,
}

impl ResultParser {
    pub fn new(resolver: TemporalResolver) -> Self {
        Self { resolver }
    }

    /// Parses `raw`, trying the structured path first when `structured` is set.
    ///
    /// `anchor` is used to complete bare dates returned by the model.
    pub fn parse(&self, raw: &str, structured: bool, anchor: DateTime<FixedOffset>) -> ParsedOutput {
        if structured {
            if let Some(result) = self.parse_structured(raw, anchor) {
                return ParsedOutput {
                    result,
                    path: ParsePath::Structured,
                };
            }
            tracing::debug!("structured output did not match schema, using fallback parser");
        }

        match first_json_object(raw) {
            Some(object) => ParsedOutput {
                result: self.coerce(&object, anchor),
                path: ParsePath::Fallback,
            },
            None => ParsedOutput {
                result: ExtractionResult::unparseable(),
                path: ParsePath::Unparseable,
            },
        }
    }

    fn parse_structured(&self, raw: &str, anchor: DateTime<FixedOffset>) -> Option<ExtractionResult> {
        let payload: StructuredPayload = serde_json::from_str(raw.trim()).ok()?;

        let mut result = ExtractionResult {
            valid: payload.valid,
            amount: payload.amount.and_then(Decimal::from_f64).map(|d| d.normalize()),
            category: payload.category.and_then(non_blank),
            subcategory: payload.subcategory.and_then(non_blank),
            description: payload.description.filter(|d| !d.trim().is_empty()),
            datetime: payload
                .datetime
                .and_then(|raw| self.resolver.parse_datetime(&raw, anchor)),
            missing_fields: Vec::new(),
            reason: payload.reason.and_then(non_blank),
        };
        for name in &payload.missing_fields {
            if let Ok(field) = ExtractionField::from_str(name) {
                result.mark_missing(field);
            }
        }
        Some(result)
    }

    fn coerce(&self, object: &Map<String, Value>, anchor: DateTime<FixedOffset>) -> ExtractionResult {
        let mut result = ExtractionResult {
            valid: object.get("valid").map(coerce_bool).unwrap_or(false),
            amount: object.get("amount").and_then(coerce_amount),
            category: object.get("category").and_then(coerce_text),
            subcategory: object
                .get("subcategory")
                .or_else(|| object.get("sub_category"))
                .and_then(coerce_text),
            description: object.get("description").and_then(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                _ => None,
            }),
            datetime: object
                .get("datetime")
                .or_else(|| object.get("date"))
                .and_then(coerce_text)
                .and_then(|raw| self.resolver.parse_datetime(&raw, anchor)),
            missing_fields: Vec::new(),
            reason: object
                .get("reason")
                .or_else(|| object.get("error"))
                .and_then(coerce_text),
        };

        if let Some(Value::Array(names)) = object.get("missing_fields") {
            for name in names.iter().filter_map(Value::as_str) {
                if let Ok(field) = ExtractionField::from_str(name) {
                    result.mark_missing(field);
                }
            }
        }
        result
    }
}

fn non_blank(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(s.clone()),
        _ => None,
    }
}

fn coerce_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .map(|d| d.normalize())
        }
        Value::String(s) => amount_from_text(s),
        _ => None,
    }
}

/// Reads the first number in text such as "₹1,200.50" or "Rs. 250".
fn amount_from_text(text: &str) -> Option<Decimal> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let negative = text[..start].trim_end().ends_with('-');

    let mut digits = String::new();
    if negative {
        digits.push('-');
    }
    let mut seen_point = false;
    for c in text[start..].chars() {
        match c {
            '0'..='9' => digits.push(c),
            ',' => {}
            '.' if !seen_point => {
                seen_point = true;
                digits.push(c);
            }
            _ => break,
        }
    }
    let digits = digits.trim_end_matches('.');
    Decimal::from_str(digits).ok().map(|d| d.normalize())
}

/// Returns the first `{...}` span in `text` that parses as a JSON object.
fn first_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('{') {
        let open = from + offset;
        if let Some(len) = balanced_object_len(&text[open..]) {
            let candidate = &text[open..open + len];
            if let Some(object) = parse_object(candidate) {
                return Some(object);
            }
        }
        from = open + 1;
    }
    None
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    let parsed = serde_json::from_str::<Value>(candidate)
        .or_else(|_| serde_json::from_str::<Value>(&strip_trailing_commas(candidate)));
    match parsed {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Byte length of the brace-balanced span starting at `text[0] == '{'`.
fn balanced_object_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Removes commas that directly precede a closing brace or bracket.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    out
}
