//! ExtractionResult - the typed outcome of one extraction attempt.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ExtractionField;

/// Reason attached to results whose model output held no usable JSON object.
pub const UNPARSEABLE_REASON: &str = "unparseable model output";

/// Structured expense extracted from free-form text.
///
/// A result with `valid == true` has `amount`, `category`, `subcategory`
/// and `description` present, with the category pair drawn from the
/// taxonomy it was validated against. A result with `valid == false` has a
/// non-empty `missing_fields` or a `reason`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub valid: bool,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub datetime: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub missing_fields: Vec<ExtractionField>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ExtractionResult {
    /// A result with every field absent and `valid == false`.
    pub fn empty() -> Self {
        Self {
            valid: false,
            amount: None,
            category: None,
            subcategory: None,
            description: None,
            datetime: None,
            missing_fields: Vec::new(),
            reason: None,
        }
    }

    /// Synthetic result for model output that contained no JSON object.
    pub fn unparseable() -> Self {
        Self {
            missing_fields: ExtractionField::REQUIRED.to_vec(),
            reason: Some(UNPARSEABLE_REASON.to_string()),
            ..Self::empty()
        }
    }

    /// Failed result carrying only a reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            missing_fields: ExtractionField::REQUIRED.to_vec(),
            reason: Some(reason.into()),
            ..Self::empty()
        }
    }

    /// Returns true if the field is reported missing.
    pub fn is_missing(&self, field: ExtractionField) -> bool {
        self.missing_fields.contains(&field)
    }

    /// Adds a field to `missing_fields`, keeping canonical order without duplicates.
    pub fn mark_missing(&mut self, field: ExtractionField) {
        if !self.is_missing(field) {
            self.missing_fields.push(field);
            self.missing_fields.sort();
        }
    }

    /// The first missing field in reporting order.
    pub fn first_missing(&self) -> Option<ExtractionField> {
        self.missing_fields.iter().min().copied()
    }
}
