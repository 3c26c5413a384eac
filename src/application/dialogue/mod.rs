//! Dialogue engine.
//!
//! Maps patient events onto the consultation stage machine, calls the
//! advisory gateway at the stages that need it, and applies the
//! stage-specific fallback when the oracle fails.

mod adaptive_pipeline;
mod engine;
mod fixed_pipeline;
mod reply;
mod user_locks;

pub use engine::{DialogueEngine, EngineError, EngineSettings};
pub use reply::{InputRejection, Reply};
pub use user_locks::UserLocks;
