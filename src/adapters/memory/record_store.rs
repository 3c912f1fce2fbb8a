//! In-memory record store implementation.
//!
//! Keeps attempt logs and expenses in process memory. Useful for tests and
//! for running the binary without a database. Does not persist data across
//! restarts.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::expense::ExpenseRecord;
use crate::domain::extraction::ExtractionAttemptLog;
use crate::domain::foundation::{AttemptLogId, DomainError, ExpenseId};
use crate::ports::RecordStore;

/// In-memory implementation of the RecordStore port.
///
/// Thread-safe via internal `Mutex`. Failure injection lets tests exercise
/// persistence-error paths.
#[derive(Default)]
pub struct InMemoryRecordStore {
    attempts: Mutex<Vec<ExtractionAttemptLog>>,
    expenses: Mutex<Vec<ExpenseRecord>>,
    fail_logs: bool,
    fail_expenses: bool,
}

impl InMemoryRecordStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `log_attempt` call fail.
    pub fn failing_logs(mut self) -> Self {
        self.fail_logs = true;
        self
    }

    /// Makes every `save_expense` call fail.
    pub fn failing_expenses(mut self) -> Self {
        self.fail_expenses = true;
        self
    }

    /// Returns all logged attempts, oldest first.
    pub fn attempts(&self) -> Vec<ExtractionAttemptLog> {
        self.attempts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Returns all saved expenses, oldest first.
    pub fn expenses(&self) -> Vec<ExpenseRecord> {
        self.expenses.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Clears all stored data.
    pub fn clear(&self) {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.clear();
        }
        if let Ok(mut expenses) = self.expenses.lock() {
            expenses.clear();
        }
    }
}

fn poisoned() -> DomainError {
    DomainError::database("record store lock poisoned")
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn log_attempt(&self, log: &ExtractionAttemptLog) -> Result<AttemptLogId, DomainError> {
        if self.fail_logs {
            return Err(DomainError::database("Simulated attempt log failure"));
        }
        self.attempts.lock().map_err(|_| poisoned())?.push(log.clone());
        Ok(log.id)
    }

    async fn save_expense(&self, record: &ExpenseRecord) -> Result<ExpenseId, DomainError> {
        if self.fail_expenses {
            return Err(DomainError::database("Simulated expense save failure"));
        }
        self.expenses.lock().map_err(|_| poisoned())?.push(record.clone());
        Ok(record.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::extraction::{AiSettings, ExtractionResult, Provider, SettingsSnapshot};
    use crate::domain::foundation::{ErrorCode, Timestamp};
    use crate::domain::taxonomy::{TaxonomyFormatter, TaxonomySnapshot};

    fn log() -> ExtractionAttemptLog {
        let settings = SettingsSnapshot::capture(
            &AiSettings::new(Provider::OpenAI, "gpt-4o-mini", 256),
            &TaxonomyFormatter::prepare(TaxonomySnapshot::new()),
        );
        ExtractionAttemptLog::new("chai 10", settings, ExtractionResult::empty(), Timestamp::now())
    }

    #[tokio::test]
    async fn logs_attempts_in_order() {
        let store = InMemoryRecordStore::new();
        let first = log();
        let second = log();

        assert_eq!(store.log_attempt(&first).await.unwrap(), first.id);
        store.log_attempt(&second).await.unwrap();

        let attempts = store.attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].id, first.id);
    }

    #[tokio::test]
    async fn failing_store_returns_database_error() {
        let store = InMemoryRecordStore::new().failing_logs();
        let err = store.log_attempt(&log()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(store.attempts().is_empty());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let store = InMemoryRecordStore::new();
        store.log_attempt(&log()).await.unwrap();
        store.clear();
        assert!(store.attempts().is_empty());
    }
}
