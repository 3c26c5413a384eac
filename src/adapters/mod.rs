//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Oracle transport (OpenAI-compatible HTTP, mock)
//! - `storage` - Live session stores (in-memory, YAML files)
//! - `profile` - Patient profile lookup
//! - `recorder` - Finished consultation sink

pub mod ai;
pub mod profile;
pub mod recorder;
pub mod storage;

pub use ai::{MockAIProvider, MockError, OpenAIConfig, OpenAIProvider};
pub use profile::InMemoryProfileProvider;
pub use recorder::InMemoryConsultationRecorder;
pub use storage::{FileSessionStore, InMemorySessionStore};
