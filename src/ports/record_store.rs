//! Record store port (write side).
//!
//! Persists audit entries for every extraction attempt and the expense
//! records produced by valid ones.
//!
//! # Design
//!
//! - **Append-only**: attempt logs are written once and never updated
//! - **Unconditional logging**: every attempt is logged, valid or not
//! - **Linked records**: an expense references the attempt that produced it

use crate::domain::expense::ExpenseRecord;
use crate::domain::extraction::ExtractionAttemptLog;
use crate::domain::foundation::{AttemptLogId, DomainError, ExpenseId};
use async_trait::async_trait;

/// Repository port for attempt logs and expenses.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append an attempt log entry.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn log_attempt(&self, log: &ExtractionAttemptLog) -> Result<AttemptLogId, DomainError>;

    /// Save an expense produced by a valid attempt.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save_expense(&self, record: &ExpenseRecord) -> Result<ExpenseId, DomainError>;
}
