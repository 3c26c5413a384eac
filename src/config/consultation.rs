//! Dialogue behaviour configuration

use serde::Deserialize;

use super::error::ConfigValidationError;
use super::list::deserialize_list;
use crate::application::dialogue::EngineSettings;
use crate::domain::consultation::normalizer::{
    DEFAULT_DISEASE_BLOCKLIST, DEFAULT_MAX_SUGGESTION_LEN, MAX_SUGGESTIONS,
};
use crate::domain::consultation::{SuggestionPolicy, SymptomNormalizer, WorkflowMode};

/// Consultation workflow settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConsultationConfig {
    /// Workflow for new consultations
    #[serde(default)]
    pub workflow: WorkflowMode,

    /// Adaptive workflow round cap
    #[serde(default = "default_max_clarifying_rounds")]
    pub max_clarifying_rounds: usize,

    /// Seconds of inactivity after which a session is dropped
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_max_suggestion_len")]
    pub max_suggestion_len: usize,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Diagnosis keywords never allowed in suggestions
    #[serde(default = "default_disease_blocklist", deserialize_with = "deserialize_list")]
    pub disease_blocklist: Vec<String>,

    /// Words that separate symptoms besides commas
    #[serde(default = "default_conjunctions", deserialize_with = "deserialize_list")]
    pub conjunctions: Vec<String>,

    /// Ask the oracle whether primary symptom text is on topic
    #[serde(default)]
    pub validate_primary_symptoms: bool,
}

impl ConsultationConfig {
    /// Validate consultation configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(1..=5).contains(&self.max_clarifying_rounds) {
            return Err(ConfigValidationError::InvalidClarifyingRounds);
        }
        if self.idle_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidIdleTimeout);
        }
        if self.max_suggestion_len == 0 || !(1..=MAX_SUGGESTIONS).contains(&self.max_suggestions)
        {
            return Err(ConfigValidationError::InvalidSuggestionLimits);
        }
        Ok(())
    }

    pub fn normalizer(&self) -> SymptomNormalizer {
        SymptomNormalizer::new(
            self.conjunctions.clone(),
            SuggestionPolicy {
                disease_blocklist: self.disease_blocklist.clone(),
                max_len: self.max_suggestion_len,
                max_count: self.max_suggestions,
            },
        )
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            workflow: self.workflow,
            max_clarifying_rounds: self.max_clarifying_rounds,
            idle_timeout_secs: self.idle_timeout_secs,
            validate_primary_symptoms: self.validate_primary_symptoms,
        }
    }
}

impl Default for ConsultationConfig {
    fn default() -> Self {
        Self {
            workflow: WorkflowMode::default(),
            max_clarifying_rounds: default_max_clarifying_rounds(),
            idle_timeout_secs: default_idle_timeout(),
            max_suggestion_len: default_max_suggestion_len(),
            max_suggestions: default_max_suggestions(),
            disease_blocklist: default_disease_blocklist(),
            conjunctions: default_conjunctions(),
            validate_primary_symptoms: false,
        }
    }
}

fn default_max_clarifying_rounds() -> usize {
    3
}

fn default_idle_timeout() -> u64 {
    1800
}

fn default_max_suggestion_len() -> usize {
    DEFAULT_MAX_SUGGESTION_LEN
}

fn default_max_suggestions() -> usize {
    MAX_SUGGESTIONS
}

fn default_disease_blocklist() -> Vec<String> {
    DEFAULT_DISEASE_BLOCKLIST.clone()
}

fn default_conjunctions() -> Vec<String> {
    vec!["and".to_string()]
}
