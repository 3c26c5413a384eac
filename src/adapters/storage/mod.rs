//! Session store adapters.
//!
//! - `InMemorySessionStore` - process-lifetime map (default)
//! - `FileSessionStore` - one YAML file per user, survives restarts

mod file_session_store;
mod in_memory_session_store;

pub use file_session_store::FileSessionStore;
pub use in_memory_session_store::InMemorySessionStore;
