//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Language-model oracle transport
//! - `SessionStore` - Live consultation sessions keyed by user
//! - `ProfileProvider` - Registered patient profiles (read-only)
//! - `ConsultationRecorder` - Finished consultation records

mod ai_provider;
mod consultation_recorder;
mod profile_provider;
mod session_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, ResponseFormat, TokenUsage,
};
pub use consultation_recorder::{ConsultationRecorder, RecorderError};
pub use profile_provider::{ProfileError, ProfileProvider};
pub use session_store::{SessionStore, SessionStoreError};
