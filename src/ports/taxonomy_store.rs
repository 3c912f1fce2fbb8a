//! Taxonomy store port (read side).
//!
//! Supplies the current category → subcategory mapping. Read once at the
//! start of every attempt; never cached across attempts.

use crate::domain::foundation::DomainError;
use crate::domain::taxonomy::TaxonomySnapshot;
use async_trait::async_trait;

/// Read-only source of the caller-defined taxonomy.
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Returns the current taxonomy, possibly empty.
    ///
    /// # Errors
    ///
    /// - `TaxonomyUnavailable` when the backing store cannot be read
    async fn get_taxonomy(&self) -> Result<TaxonomySnapshot, DomainError>;
}
