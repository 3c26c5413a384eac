//! Symptom Intake - conversational symptom collection that ends in a
//! specialist recommendation with an urgency level.
//!
//! The dialogue engine walks a patient through a staged consultation,
//! consults a language-model oracle through the advisory gateway, and
//! always reaches a terminal answer, falling back to a default specialist
//! when the oracle fails.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
