//! AI Advisory Gateway: the oracle behind a strict JSON contract.

mod contract;
mod gateway;
mod prompts;

pub use contract::{extract_json, strip_code_fences, AdvisoryError};
pub use gateway::{AdvisoryGateway, AdvisorySettings, Assessment, SymptomValidation};
