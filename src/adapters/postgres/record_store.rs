//! PostgreSQL implementation of RecordStore.
//!
//! Attempt logs go to `extraction_attempts`, expenses to `expenses`. The
//! result and settings snapshots are stored as JSONB next to the indexed
//! columns queries filter on.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::expense::ExpenseRecord;
use crate::domain::extraction::ExtractionAttemptLog;
use crate::domain::foundation::{AttemptLogId, DomainError, ErrorCode, ExpenseId};
use crate::ports::RecordStore;

/// PostgreSQL implementation of RecordStore.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a new PostgresRecordStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn log_attempt(&self, log: &ExtractionAttemptLog) -> Result<AttemptLogId, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO extraction_attempts (
                id, input_text, provider, model, temperature, max_tokens,
                taxonomy_version, settings, raw_output, parse_path, valid,
                result, low_confidence_datetime, latency_ms, prompt_tokens,
                completion_tokens, error, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(&log.input_text)
        .bind(log.settings.provider.as_str())
        .bind(&log.settings.model)
        .bind(log.settings.temperature)
        .bind(to_i32(log.settings.max_tokens))
        .bind(&log.settings.taxonomy_version)
        .bind(Json(&log.settings))
        .bind(log.raw_output.as_deref())
        .bind(log.parse_path.as_ref().map(|p| p.as_str()))
        .bind(log.result.valid)
        .bind(Json(&log.result))
        .bind(log.low_confidence_datetime)
        .bind(log.latency_ms.map(|ms| i64::try_from(ms).unwrap_or(i64::MAX)))
        .bind(log.prompt_tokens.map(to_i32))
        .bind(log.completion_tokens.map(to_i32))
        .bind(log.error.as_deref())
        .bind(log.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert extraction attempt: {}", e),
            )
            .with_detail("attempt_log_id", log.id.to_string())
        })?;

        Ok(log.id)
    }

    async fn save_expense(&self, record: &ExpenseRecord) -> Result<ExpenseId, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, amount, category, subcategory, description, spent_at,
                provider, model, original_query, attempt_log_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.amount)
        .bind(&record.category)
        .bind(&record.subcategory)
        .bind(&record.description)
        .bind(record.spent_at)
        .bind(record.provider.as_str())
        .bind(&record.model)
        .bind(&record.original_query)
        .bind(record.attempt_log_id.as_uuid())
        .bind(record.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to insert expense: {}", e),
            )
            .with_detail("attempt_log_id", record.attempt_log_id.to_string())
        })?;

        Ok(record.id)
    }
}

/// Token counts and limits are stored as INTEGER.
fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
