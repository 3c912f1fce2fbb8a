//! Validator - the taxonomy-authority boundary.
//!
//! The only place extracted values are accepted as final. Field presence is
//! recomputed from scratch, taxonomy membership is enforced against the
//! attempt's snapshot, non-positive amounts are rejected, and an absent
//! datetime defaults to the request anchor.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use super::{ExtractionField, ExtractionResult, TemporalResolver};
use crate::domain::taxonomy::TaxonomySnapshot;

/// Produces the final result for a parsed candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    resolver: TemporalResolver,
}

impl Validator {
    pub fn new(resolver: TemporalResolver) -> Self {
        Self { resolver }
    }

    /// Validates `candidate` against `taxonomy`.
    ///
    /// The model's own `valid` flag and `missing_fields` are ignored; only
    /// its `reason` survives, and only when the result is invalid.
    pub fn validate(
        &self,
        candidate: ExtractionResult,
        taxonomy: &TaxonomySnapshot,
        anchor: DateTime<FixedOffset>,
    ) -> ExtractionResult {
        let model_reason = candidate.reason.clone();
        let mut result = ExtractionResult {
            missing_fields: Vec::new(),
            reason: None,
            ..candidate
        };

        if result.amount.is_none() {
            result.mark_missing(ExtractionField::Amount);
        }
        if result.category.is_none() {
            result.mark_missing(ExtractionField::Category);
        }
        if result.subcategory.is_none() {
            result.mark_missing(ExtractionField::Subcategory);
        }
        if result.description.as_deref().map_or(true, |d| d.trim().is_empty()) {
            result.description = None;
            result.mark_missing(ExtractionField::Description);
        }

        self.enforce_taxonomy(&mut result, taxonomy);

        if result.amount.is_some_and(|amount| amount <= Decimal::ZERO) {
            result.amount = None;
            result.mark_missing(ExtractionField::Amount);
        }

        result.datetime = Some(match result.datetime {
            Some(dt) => self.resolver.normalize(dt),
            None => self.resolver.normalize(anchor),
        });

        result.valid = result.missing_fields.is_empty();
        if !result.valid {
            let generic = result.first_missing().map(generic_reason);
            result.reason = model_reason.filter(|r| !r.trim().is_empty()).or(generic);
        }
        result
    }

    fn enforce_taxonomy(&self, result: &mut ExtractionResult, taxonomy: &TaxonomySnapshot) {
        let accepted = match (result.category.as_deref(), result.subcategory.as_deref()) {
            (Some(category), Some(subcategory)) => taxonomy
                .find_pair(category, subcategory)
                .map(|(c, s)| (Some(c.to_string()), Some(s.to_string()))),
            (Some(category), None) => taxonomy
                .find_category(category)
                .map(|c| (Some(c.name.clone()), None)),
            (None, Some(_)) => None,
            (None, None) => Some((None, None)),
        };

        match accepted {
            Some((category, subcategory)) => {
                result.category = category;
                result.subcategory = subcategory;
            }
            None => {
                tracing::debug!(
                    category = ?result.category,
                    subcategory = ?result.subcategory,
                    "rejected taxonomy values not in snapshot"
                );
                result.category = None;
                result.subcategory = None;
                result.mark_missing(ExtractionField::Category);
                result.mark_missing(ExtractionField::Subcategory);
            }
        }
    }
}

fn generic_reason(field: ExtractionField) -> String {
    format!("could not determine a valid {} from the input", field)
}
