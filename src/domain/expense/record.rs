//! ExpenseRecord - a finished expense ready for the record store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::extraction::{ExtractionField, ExtractionResult, Provider};
use crate::domain::foundation::{AttemptLogId, ExpenseId, Timestamp, ValidationError};

/// Expense built from a valid extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub amount: Decimal,
    pub category: String,
    pub subcategory: String,
    /// Verbatim text as the model returned it.
    pub description: String,
    /// When the expense happened, in UTC.
    pub spent_at: DateTime<Utc>,
    pub provider: Provider,
    pub model: String,
    /// The caller's original input.
    pub original_query: String,
    pub attempt_log_id: AttemptLogId,
    pub created_at: Timestamp,
}

impl ExpenseRecord {
    /// Builds a record from a validated result.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the result is not valid or lacks a field.
    pub fn from_valid(
        result: &ExtractionResult,
        original_query: impl Into<String>,
        provider: Provider,
        model: impl Into<String>,
        attempt_log_id: AttemptLogId,
        created_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        if !result.valid {
            return Err(ValidationError::invalid_format(
                "result",
                "only valid extractions can be recorded",
            ));
        }
        let missing = |field: ExtractionField| ValidationError::empty_field(field.as_str());

        Ok(Self {
            id: ExpenseId::new(),
            amount: result.amount.ok_or_else(|| missing(ExtractionField::Amount))?,
            category: result.category.clone().ok_or_else(|| missing(ExtractionField::Category))?,
            subcategory: result
                .subcategory
                .clone()
                .ok_or_else(|| missing(ExtractionField::Subcategory))?,
            description: result
                .description
                .clone()
                .ok_or_else(|| missing(ExtractionField::Description))?,
            spent_at: result
                .datetime
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| *created_at.as_datetime()),
            provider,
            model: model.into(),
            original_query: original_query.into(),
            attempt_log_id,
            created_at,
        })
    }
}
