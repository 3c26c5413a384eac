//! Oracle response contract.
//!
//! Raw oracle text is untrusted: it may be wrapped in markdown fences,
//! surrounded by prose, or simply wrong. Everything here turns that text
//! into typed replies or an [`AdvisoryError`]; parser errors never leave
//! this module.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::ports::AIError;

/// Why an oracle call produced no usable answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisoryError {
    /// Transport failure: network, auth, rate limit, provider outage.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish within the configured budget.
    #[error("oracle timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The oracle answered but broke the JSON contract.
    #[error("oracle contract violation: {0}")]
    ContractViolation(String),
}

impl AdvisoryError {
    pub fn contract(reason: impl Into<String>) -> Self {
        AdvisoryError::ContractViolation(reason.into())
    }
}

impl From<AIError> for AdvisoryError {
    fn from(err: AIError) -> Self {
        match err {
            AIError::Timeout { timeout_secs } => AdvisoryError::Timeout {
                timeout_ms: u64::from(timeout_secs) * 1000,
            },
            AIError::Parse(reason) => AdvisoryError::ContractViolation(reason),
            other => AdvisoryError::Unavailable(other.to_string()),
        }
    }
}

/// Removes a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string ("json", "JSON", ...) on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Slice holding the JSON document in `raw`.
///
/// A reply that starts with `[` is a bare list. Otherwise the first `{` up
/// to the last `}` wins, so bracketed prose before an object is skipped; a
/// list is only searched for when there is no object at all.
pub fn extract_json(raw: &str) -> Option<&str> {
    let text = strip_code_fences(raw);
    if text.starts_with('[') {
        return delimited(text, '[', ']');
    }
    delimited(text, '{', '}').or_else(|| delimited(text, '[', ']'))
}

fn delimited(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parses the oracle's raw text into `T`.
pub fn parse_reply<T: DeserializeOwned>(raw: &str) -> Result<T, AdvisoryError> {
    let json = extract_json(raw).ok_or_else(|| AdvisoryError::contract("no JSON in response"))?;
    serde_json::from_str(json).map_err(|e| AdvisoryError::contract(e.to_string()))
}

// ----- Reply shapes -----

/// Answer to `validate_symptoms`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationReply {
    #[serde(alias = "isValid")]
    pub is_valid: bool,
    #[serde(default, alias = "cleanedText")]
    pub cleaned_text: Option<String>,
    #[serde(default, alias = "rejectionReason")]
    pub rejection_reason: Option<String>,
}

/// Answer to `generate_additional_symptoms`: an object or a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SuggestionReply {
    Object { symptoms: Vec<String> },
    List(Vec<String>),
}

impl SuggestionReply {
    pub fn into_symptoms(self) -> Vec<String> {
        match self {
            SuggestionReply::Object { symptoms } | SuggestionReply::List(symptoms) => symptoms,
        }
    }
}

/// Answer to `recommend`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationReply {
    #[serde(alias = "doctor")]
    pub specialist: String,
    pub urgency: String,
    pub reasoning: String,
}

/// Answer to an adaptive `assess` turn.
#[derive(Debug, Clone, Deserialize)]
pub struct AssessmentReply {
    pub action: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default, alias = "doctor")]
    pub specialist: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn extracts_json_from_prose() {
        let raw = "Sure! Here you go: {\"symptoms\": [\"chills\"]} Hope it helps.";
        assert_eq!(extract_json(raw), Some("{\"symptoms\": [\"chills\"]}"));
    }

    #[test]
    fn bracketed_prose_before_object_is_skipped() {
        let raw = "Note [1]: {\"specialist\": \"Neurologist\", \"urgency\": \"low\", \"reasoning\": \"ok\"}";
        assert_eq!(
            extract_json(raw),
            Some("{\"specialist\": \"Neurologist\", \"urgency\": \"low\", \"reasoning\": \"ok\"}")
        );
        let reply: RecommendationReply = parse_reply(raw).unwrap();
        assert_eq!(reply.urgency, "low");
    }

    #[test]
    fn bare_list_is_extracted() {
        assert_eq!(
            extract_json("[\"chills\", \"fatigue\"]"),
            Some("[\"chills\", \"fatigue\"]")
        );
        assert_eq!(
            extract_json("Symptoms: [\"chills\"]"),
            Some("[\"chills\"]")
        );
    }

    #[test]
    fn no_json_is_none() {
        assert_eq!(extract_json("I cannot help with that."), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn suggestion_reply_accepts_object_and_list() {
        let object: SuggestionReply = parse_reply(r#"{"symptoms": ["a", "b"]}"#).unwrap();
        let list: SuggestionReply = parse_reply(r#"["a", "b"]"#).unwrap();
        assert_eq!(object.into_symptoms(), vec!["a", "b"]);
        assert_eq!(list.into_symptoms(), vec!["a", "b"]);
    }

    #[test]
    fn validation_reply_accepts_camel_case() {
        let reply: ValidationReply = parse_reply(
            r#"{"isValid": false, "cleanedText": "", "rejectionReason": "recipe"}"#,
        )
        .unwrap();
        assert!(!reply.is_valid);
        assert_eq!(reply.rejection_reason.as_deref(), Some("recipe"));
    }

    #[test]
    fn recommendation_missing_field_is_contract_violation() {
        let err = parse_reply::<RecommendationReply>(r#"{"specialist": "Neurologist"}"#)
            .unwrap_err();
        assert!(matches!(err, AdvisoryError::ContractViolation(_)));
    }

    #[test]
    fn recommendation_accepts_doctor_alias() {
        let reply: RecommendationReply = parse_reply(
            r#"{"doctor": "Cardiologist", "urgency": "high", "reasoning": "chest pain"}"#,
        )
        .unwrap();
        assert_eq!(reply.specialist, "Cardiologist");
    }

    #[test]
    fn malformed_json_is_contract_violation() {
        let err = parse_reply::<AssessmentReply>("{\"action\": ").unwrap_err();
        assert!(matches!(err, AdvisoryError::ContractViolation(_)));
    }

    #[test]
    fn transport_errors_map_to_unavailable_or_timeout() {
        assert_eq!(
            AdvisoryError::from(AIError::Timeout { timeout_secs: 2 }),
            AdvisoryError::Timeout { timeout_ms: 2000 }
        );
        assert!(matches!(
            AdvisoryError::from(AIError::AuthenticationFailed),
            AdvisoryError::Unavailable(_)
        ));
        assert!(matches!(
            AdvisoryError::from(AIError::parse("eof")),
            AdvisoryError::ContractViolation(_)
        ));
    }
}
