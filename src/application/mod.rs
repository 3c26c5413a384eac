//! Application layer.
//!
//! - `advisory` - the oracle gateway with its JSON contracts
//! - `dialogue` - the per-user consultation engine

pub mod advisory;
pub mod dialogue;
