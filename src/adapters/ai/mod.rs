//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Configurable mock for testing
//! - `OpenAIProvider` - OpenAI-compatible chat completions (Groq by default)

mod mock_provider;
mod openai_provider;

pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider, DEFAULT_BASE_URL, DEFAULT_MODEL};
