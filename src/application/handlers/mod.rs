//! Application handlers.

mod extract_expense;

pub use extract_expense::{
    ExtractExpenseConfig, ExtractExpenseError, ExtractExpenseHandler, ExtractionOutcome,
};
