//! File-backed adapters.

mod taxonomy_store;

pub use taxonomy_store::YamlTaxonomyStore;
