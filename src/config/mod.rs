//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SYMPTOM_INTAKE` prefix and nested values use `__` as separator.
//!
//! # Example
//!
//! ```no_run
//! use symptom_intake::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Workflow: {:?}", config.consultation.workflow);
//! ```

mod ai;
mod consultation;
mod error;
mod list;
mod logging;
mod specialists;
mod storage;

pub use ai::AiConfig;
pub use consultation::ConsultationConfig;
pub use error::{ConfigError, ConfigValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use specialists::SpecialistsConfig;
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults except the oracle API key, which
/// [`AppConfig::validate()`] requires.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Oracle connection (OpenAI-compatible endpoint)
    #[serde(default)]
    pub ai: AiConfig,

    /// Workflow, limits and normalizer settings
    #[serde(default)]
    pub consultation: ConsultationConfig,

    /// Specialist roster and fallback
    #[serde(default)]
    pub specialists: SpecialistsConfig,

    /// Live session storage
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SYMPTOM_INTAKE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SYMPTOM_INTAKE__AI__TIMEOUT_SECS=10` -> `ai.timeout_secs = 10`
    /// - `SYMPTOM_INTAKE__SPECIALISTS__ROSTER=Cardiologist,Neurologist`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SYMPTOM_INTAKE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.ai.validate()?;
        self.consultation.validate()?;
        self.specialists.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
