//! AI Advisory Gateway.
//!
//! Wraps the oracle behind four operations with strict JSON contracts.
//! Every call is bounded by a timeout; transport failures, timeouts and
//! contract violations all surface as [`AdvisoryError`] so the dialogue
//! engine can apply its stage-specific fallback. The gateway holds no
//! per-consultation state and is safe to retry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use super::contract::{
    parse_reply, AdvisoryError, AssessmentReply, RecommendationReply, SuggestionReply,
    ValidationReply,
};
use super::prompts;
use crate::domain::consultation::{
    ConsultationSession, Recommendation, SpecialistRoster, SymptomNormalizer, Urgency,
};
use crate::domain::foundation::{Timestamp, ValidationError};
use crate::ports::{AIProvider, CompletionRequest, MessageRole, RequestMetadata};

/// Tunables for oracle calls.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorySettings {
    /// Upper bound for one oracle call, retries included.
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

/// Outcome of `validate_symptoms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymptomValidation {
    pub is_valid: bool,
    /// Cleaned symptom text; the original text when the oracle sent none.
    pub cleaned_text: String,
    /// Empty when valid.
    pub rejection_reason: String,
}

/// Oracle decision for one adaptive turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    AskQuestion(String),
    Recommend(Recommendation),
}

const DEFAULT_REJECTION: &str = "the message does not describe symptoms";

/// Gateway to the language-model oracle.
pub struct AdvisoryGateway {
    provider: Arc<dyn AIProvider>,
    normalizer: SymptomNormalizer,
    roster: SpecialistRoster,
    settings: AdvisorySettings,
}

impl AdvisoryGateway {
    pub fn new(
        provider: Arc<dyn AIProvider>,
        normalizer: SymptomNormalizer,
        roster: SpecialistRoster,
        settings: AdvisorySettings,
    ) -> Self {
        Self {
            provider,
            normalizer,
            roster,
            settings,
        }
    }

    pub fn roster(&self) -> &SpecialistRoster {
        &self.roster
    }

    pub fn normalizer(&self) -> &SymptomNormalizer {
        &self.normalizer
    }

    pub fn settings(&self) -> &AdvisorySettings {
        &self.settings
    }

    /// Checks that free text describes symptoms.
    pub async fn validate_symptoms(
        &self,
        session: &ConsultationSession,
        text: &str,
    ) -> Result<SymptomValidation, AdvisoryError> {
        let raw = self
            .call(
                session,
                "validate",
                prompts::VALIDATE_SYSTEM.to_string(),
                prompts::validate_user(text),
            )
            .await?;
        let reply: ValidationReply = parse_reply(&raw)?;

        let cleaned_text = reply
            .cleaned_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text.trim().to_string());
        let rejection_reason = if reply.is_valid {
            String::new()
        } else {
            reply
                .rejection_reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION.to_string())
        };

        Ok(SymptomValidation {
            is_valid: reply.is_valid,
            cleaned_text,
            rejection_reason,
        })
    }

    /// Proposes additional symptoms for the session's primary symptoms and
    /// duration, filtered against what the patient typed in. Suggestions
    /// already selected may be offered again so the selection survives.
    pub async fn generate_additional_symptoms(
        &self,
        session: &ConsultationSession,
    ) -> Result<Vec<String>, AdvisoryError> {
        let today = Timestamp::now().date();
        let raw = self
            .call(
                session,
                "suggest",
                prompts::SUGGEST_SYSTEM.to_string(),
                prompts::suggest_user(
                    session.primary_symptoms(),
                    session.duration(),
                    session.profile(),
                    today,
                ),
            )
            .await?;
        let candidates = parse_reply::<SuggestionReply>(&raw)?.into_symptoms();

        let filtered = self
            .normalizer
            .filter_suggestions(&candidates, &session.reported_symptoms());
        debug!(
            consultation_id = %session.id(),
            proposed = candidates.len(),
            kept = filtered.len(),
            "Suggestions filtered"
        );
        Ok(filtered)
    }

    /// Asks for the final specialist and urgency.
    pub async fn recommend(
        &self,
        session: &ConsultationSession,
    ) -> Result<Recommendation, AdvisoryError> {
        let today = Timestamp::now().date();
        let raw = self
            .call(
                session,
                "recommend",
                prompts::recommend_system(&self.roster),
                prompts::recommend_user(
                    &session.all_symptoms(),
                    session.duration(),
                    session.qa_history(),
                    session.profile(),
                    today,
                ),
            )
            .await?;
        let reply: RecommendationReply = parse_reply(&raw)?;
        self.to_recommendation(session, &reply.specialist, &reply.urgency, reply.reasoning)
    }

    /// Lets the oracle choose between another question and a recommendation.
    pub async fn assess(&self, session: &ConsultationSession) -> Result<Assessment, AdvisoryError> {
        let today = Timestamp::now().date();
        let raw = self
            .call(
                session,
                "assess",
                prompts::assess_system(&self.roster),
                prompts::assess_user(
                    session.primary_symptoms(),
                    session.qa_history(),
                    session.profile(),
                    today,
                ),
            )
            .await?;
        let reply: AssessmentReply = parse_reply(&raw)?;

        match reply.action.trim() {
            "ask_question" => {
                let question = reply
                    .question
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty())
                    .ok_or_else(|| AdvisoryError::contract("ask_question without a question"))?;
                Ok(Assessment::AskQuestion(question))
            }
            "recommend_doctor" => {
                let specialist = reply
                    .specialist
                    .ok_or_else(|| AdvisoryError::contract("recommendation without specialist"))?;
                let urgency = reply
                    .urgency
                    .ok_or_else(|| AdvisoryError::contract("recommendation without urgency"))?;
                let recommendation = self.to_recommendation(
                    session,
                    &specialist,
                    &urgency,
                    reply.reasoning.unwrap_or_default(),
                )?;
                Ok(Assessment::Recommend(recommendation))
            }
            other => Err(AdvisoryError::contract(format!("unknown action '{}'", other))),
        }
    }

    fn to_recommendation(
        &self,
        session: &ConsultationSession,
        specialist: &str,
        urgency: &str,
        reasoning: String,
    ) -> Result<Recommendation, AdvisoryError> {
        let urgency: Urgency = urgency
            .parse()
            .map_err(|e: ValidationError| AdvisoryError::contract(e.to_string()))?;

        let resolved = self.roster.coerce(specialist);
        if self.roster.find(specialist).is_none() {
            warn!(
                consultation_id = %session.id(),
                proposed = specialist,
                fallback = %resolved,
                "Oracle proposed a specialist outside the roster"
            );
        }

        Ok(Recommendation {
            specialist: resolved,
            urgency,
            reasoning: reasoning.trim().to_string(),
            is_fallback: false,
        })
    }

    async fn call(
        &self,
        session: &ConsultationSession,
        operation: &'static str,
        system: String,
        user: String,
    ) -> Result<String, AdvisoryError> {
        let metadata = RequestMetadata::new(
            session.user_id().clone(),
            session.id(),
            operation,
            Uuid::new_v4().to_string(),
        );
        let request = CompletionRequest::new(metadata)
            .with_system_prompt(system)
            .with_message(MessageRole::User, user)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens)
            .with_json_response();

        match tokio::time::timeout(self.settings.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => Ok(response.content),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(AdvisoryError::Timeout {
                timeout_ms: self.settings.timeout.as_millis() as u64,
            }),
        }
    }
}
