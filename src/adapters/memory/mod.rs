//! In-memory adapters for the collaborator ports.
//!
//! Used by tests and by the binary when no database is configured.

mod credential_store;
mod record_store;
mod settings_store;
mod taxonomy_store;

pub use credential_store::InMemoryCredentialStore;
pub use record_store::InMemoryRecordStore;
pub use settings_store::InMemorySettingsStore;
pub use taxonomy_store::InMemoryTaxonomyStore;
