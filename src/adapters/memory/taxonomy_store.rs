//! In-memory taxonomy store.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::taxonomy::TaxonomySnapshot;
use crate::ports::TaxonomyStore;

/// Taxonomy held in memory; replaceable at runtime.
#[derive(Default)]
pub struct InMemoryTaxonomyStore {
    snapshot: RwLock<TaxonomySnapshot>,
    unavailable: bool,
}

impl InMemoryTaxonomyStore {
    pub fn new(snapshot: TaxonomySnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            unavailable: false,
        }
    }

    /// A store whose reads always fail.
    pub fn unavailable() -> Self {
        Self {
            snapshot: RwLock::default(),
            unavailable: true,
        }
    }

    /// Replaces the stored taxonomy.
    pub fn replace(&self, snapshot: TaxonomySnapshot) {
        if let Ok(mut current) = self.snapshot.write() {
            *current = snapshot;
        }
    }
}

#[async_trait]
impl TaxonomyStore for InMemoryTaxonomyStore {
    async fn get_taxonomy(&self) -> Result<TaxonomySnapshot, DomainError> {
        if self.unavailable {
            return Err(DomainError::new(
                ErrorCode::TaxonomyUnavailable,
                "taxonomy store unavailable",
            ));
        }
        self.snapshot
            .read()
            .map(|s| s.clone())
            .map_err(|_| DomainError::new(ErrorCode::TaxonomyUnavailable, "taxonomy lock poisoned"))
    }
}
