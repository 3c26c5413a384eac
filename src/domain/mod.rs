//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `consultation` - Symptom intake session, stages, prompts and the normalizer

pub mod consultation;
pub mod foundation;
