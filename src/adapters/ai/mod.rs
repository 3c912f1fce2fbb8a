//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port for various LLM providers.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Configurable mock for testing
//! - `OpenAIProvider` - OpenAI chat completions with strict JSON-schema output
//! - `GeminiProvider` - Google Gemini generateContent, free-text JSON
//! - `HttpProviderFactory` / `StaticProviderFactory` - `ProviderFactory` implementations

mod factory;
mod gemini_provider;
mod mock_provider;
mod openai_provider;

pub use factory::{HttpProviderFactory, StaticProviderFactory};
pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
