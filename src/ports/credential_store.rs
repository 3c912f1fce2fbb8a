//! Credential store port.
//!
//! API keys never leave a `Secret` except at the HTTP boundary.

use secrecy::Secret;

use crate::domain::extraction::Provider;

/// Per-provider API key lookup.
pub trait CredentialStore: Send + Sync {
    /// Returns the API key for `provider`, or `None` when not configured.
    fn api_key(&self, provider: Provider) -> Option<Secret<String>>;
}
