//! Specialist roster configuration

use serde::Deserialize;

use super::error::ConfigValidationError;
use super::list::deserialize_list;
use crate::domain::consultation::{SpecialistRoster, DEFAULT_FALLBACK_SPECIALIST, DEFAULT_ROSTER};

/// Closed list of specialists the oracle may name
#[derive(Debug, Clone, Deserialize)]
pub struct SpecialistsConfig {
    #[serde(default = "default_roster", deserialize_with = "deserialize_list")]
    pub roster: Vec<String>,

    /// Used whenever the oracle answer cannot be trusted; always part of
    /// the roster
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

impl SpecialistsConfig {
    /// Validate roster configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.fallback.trim().is_empty() {
            return Err(ConfigValidationError::BlankFallbackSpecialist);
        }
        if self.roster.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyRoster);
        }
        Ok(())
    }

    pub fn to_roster(&self) -> Result<SpecialistRoster, ConfigValidationError> {
        SpecialistRoster::new(self.roster.clone(), self.fallback.clone())
            .map_err(|_| ConfigValidationError::BlankFallbackSpecialist)
    }
}

impl Default for SpecialistsConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            fallback: default_fallback(),
        }
    }
}

fn default_roster() -> Vec<String> {
    DEFAULT_ROSTER.iter().map(|s| s.to_string()).collect()
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK_SPECIALIST.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster_is_valid() {
        let config = SpecialistsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.to_roster().unwrap(), SpecialistRoster::standard());
    }

    #[test]
    fn test_fallback_joins_roster() {
        let config = SpecialistsConfig {
            roster: vec!["Cardiologist".to_string()],
            fallback: "Therapist".to_string(),
        };
        let roster = config.to_roster().unwrap();
        assert_eq!(roster.fallback().as_str(), "Therapist");
        assert!(roster.find("therapist").is_some());
    }

    #[test]
    fn test_empty_roster_rejected() {
        let config = SpecialistsConfig {
            roster: vec![" ".to_string()],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyRoster));
    }
}
