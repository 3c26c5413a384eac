//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ConfigValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid AI request timeout (must be 1-60 seconds)")]
    InvalidTimeout,

    #[error("Invalid AI temperature (must be 0.0-2.0)")]
    InvalidTemperature,

    #[error("Invalid AI base URL")]
    InvalidBaseUrl,

    #[error("Invalid maximum clarifying rounds (must be 1-5)")]
    InvalidClarifyingRounds,

    #[error("Idle timeout must be positive")]
    InvalidIdleTimeout,

    #[error("Suggestion length must be positive and suggestion count 1 to 10")]
    InvalidSuggestionLimits,

    #[error("Specialist roster is empty")]
    EmptyRoster,

    #[error("Fallback specialist is blank")]
    BlankFallbackSpecialist,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
