//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the extraction pipeline to external systems:
//! - `ai` - OpenAI and Gemini HTTP clients, mock provider, provider factories
//! - `memory` - In-memory stores for tests and database-less runs
//! - `file` - YAML taxonomy file
//! - `postgres` - PostgreSQL record store

pub mod ai;
pub mod file;
pub mod memory;
pub mod postgres;

pub use ai::{HttpProviderFactory, MockAIProvider, StaticProviderFactory};
pub use file::YamlTaxonomyStore;
pub use memory::{
    InMemoryCredentialStore, InMemoryRecordStore, InMemorySettingsStore, InMemoryTaxonomyStore,
};
pub use postgres::PostgresRecordStore;
