//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the extraction pipeline and the outside world. Adapters implement these ports.
//!
//! ## Provider Ports
//!
//! - `AIProvider` - One completion call against a language model
//! - `ProviderFactory` - Builds provider clients for a provider/model/key
//!
//! ## Collaborator Ports
//!
//! - `TaxonomyStore` - Current categories and subcategories
//! - `SettingsStore` - Provider, model and generation settings
//! - `CredentialStore` - Per-provider API keys
//! - `RecordStore` - Attempt logs and expense records
//! - `Clock` - The instant an attempt begins

mod ai_provider;
mod clock;
mod credential_store;
mod record_store;
mod settings_store;
mod taxonomy_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message, MessageRole,
    ProviderFactory, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use credential_store::CredentialStore;
pub use record_store::RecordStore;
pub use settings_store::SettingsStore;
pub use taxonomy_store::TaxonomyStore;
