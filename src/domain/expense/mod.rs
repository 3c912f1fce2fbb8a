//! Expense module - records persisted after a valid extraction.

mod record;

pub use record::ExpenseRecord;
