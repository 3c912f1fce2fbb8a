//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresRecordStore` - Attempt logs and expense records

mod record_store;

pub use record_store::PostgresRecordStore;
