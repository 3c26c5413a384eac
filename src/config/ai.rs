//! Advisory oracle configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ConfigValidationError;
use crate::adapters::ai::{OpenAIConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::application::advisory::AdvisorySettings;

/// Oracle connection and call settings
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key for the OpenAI-compatible endpoint
    pub api_key: Option<String>,

    /// Endpoint base URL (Groq by default)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound for one gateway call in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries on transient failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.has_api_key() {
            return Err(ConfigValidationError::MissingRequired("AI__API_KEY"));
        }
        if !(1..=60).contains(&self.timeout_secs) {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigValidationError::InvalidTemperature);
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ConfigValidationError::InvalidBaseUrl);
        }
        Ok(())
    }

    /// Transport settings for the OpenAI-compatible provider
    pub fn provider_config(&self) -> Result<OpenAIConfig, ConfigValidationError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigValidationError::MissingRequired("AI__API_KEY"))?;

        Ok(OpenAIConfig::new(api_key)
            .with_base_url(&self.base_url)
            .with_model(&self.model)
            .with_timeout(self.timeout())
            .with_max_retries(self.max_retries))
    }

    /// Per-call settings for the advisory gateway
    pub fn advisory_settings(&self) -> AdvisorySettings {
        AdvisorySettings {
            timeout: self.timeout(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_retries() -> u32 {
    1
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    500
}
