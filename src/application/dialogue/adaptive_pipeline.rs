//! Adaptive workflow: after the first description the oracle decides every
//! turn whether to ask another question or recommend, up to a round cap.

use tracing::{debug, warn};

use super::engine::{DialogueEngine, EngineError, Step};
use super::reply::InputRejection;
use crate::application::advisory::Assessment;
use crate::domain::consultation::prompt::FALLBACK_CLARIFYING_QUESTION;
use crate::domain::consultation::{ConsultationSession, ConsultationStage, UserEvent};

impl DialogueEngine {
    pub(super) async fn adaptive_step(
        &self,
        session: &mut ConsultationSession,
        event: UserEvent,
    ) -> Result<Step, EngineError> {
        match (session.stage(), event) {
            (ConsultationStage::CollectingSymptoms, UserEvent::TextInput(text)) => {
                let validate = self.settings.validate_primary_symptoms;
                match self.read_symptoms(session, &text, validate).await {
                    Ok(symptoms) => {
                        session.add_primary_symptoms(symptoms);
                        self.adaptive_turn(session).await
                    }
                    Err(rejection) => Ok(Step::Reject(rejection)),
                }
            }
            (ConsultationStage::AwaitingClarifyingAnswer, UserEvent::TextInput(text)) => {
                let answer = text.trim();
                if answer.is_empty() {
                    return Ok(Step::Reject(InputRejection::EmptyInput));
                }
                session.record_answer(answer);
                self.adaptive_turn(session).await
            }
            _ => Ok(Step::Ignore),
        }
    }

    async fn adaptive_turn(&self, session: &mut ConsultationSession) -> Result<Step, EngineError> {
        if session.clarifying_rounds() >= self.settings.max_clarifying_rounds {
            debug!(
                user_id = %session.user_id(),
                rounds = session.clarifying_rounds(),
                "Clarifying round cap reached, forcing recommendation"
            );
            return Ok(Step::Complete(self.recommend_or_fallback(session).await));
        }

        let question = match self.gateway.assess(session).await {
            Ok(Assessment::Recommend(recommendation)) => {
                return Ok(Step::Complete(recommendation));
            }
            Ok(Assessment::AskQuestion(question)) => question,
            Err(e) => {
                warn!(
                    user_id = %session.user_id(),
                    consultation_id = %session.id(),
                    error = %e,
                    "Assessment failed, asking a generic clarifying question"
                );
                FALLBACK_CLARIFYING_QUESTION.to_string()
            }
        };

        session.ask(question);
        session.advance_to(ConsultationStage::AwaitingClarifyingAnswer)?;
        Ok(Step::Save)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::profile::InMemoryProfileProvider;
    use crate::adapters::recorder::InMemoryConsultationRecorder;
    use crate::adapters::storage::InMemorySessionStore;
    use crate::application::advisory::{AdvisoryGateway, AdvisorySettings};
    use crate::application::dialogue::{DialogueEngine, EngineSettings, Reply};
    use crate::domain::consultation::prompt::FALLBACK_CLARIFYING_QUESTION;
    use crate::domain::consultation::{
        ChoiceToken, ConsultationStage, PatientProfile, RecordDetails, SpecialistRoster,
        SymptomNormalizer, Urgency, UserEvent, WorkflowMode,
    };
    use crate::domain::foundation::UserId;

    const ASK: &str = r#"{"action": "ask_question", "question": "Do you have a fever?"}"#;

    async fn engine(provider: MockAIProvider, max_rounds: usize) -> (DialogueEngine, UserId) {
        let user = UserId::new("patient-1").unwrap();
        let profiles = InMemoryProfileProvider::new();
        profiles.insert(user.clone(), PatientProfile::default()).await;
        let gateway = AdvisoryGateway::new(
            Arc::new(provider),
            SymptomNormalizer::default(),
            SpecialistRoster::standard(),
            AdvisorySettings::default(),
        );
        let settings = EngineSettings {
            workflow: WorkflowMode::Adaptive,
            max_clarifying_rounds: max_rounds,
            ..EngineSettings::default()
        };
        let engine = DialogueEngine::new(
            gateway,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(profiles),
            Arc::new(InMemoryConsultationRecorder::new()),
            settings,
        );
        engine
            .handle(&user, UserEvent::choice(ChoiceToken::StartConsultation))
            .await
            .unwrap();
        (engine, user)
    }

    #[tokio::test]
    async fn oracle_question_is_asked() {
        let (engine, user) = engine(MockAIProvider::new().with_response(ASK), 3).await;

        let reply = engine.handle(&user, UserEvent::text("sore throat")).await.unwrap();

        assert_eq!(reply.prompt().unwrap().text, "Do you have a fever?");
        let session = engine.session(&user).await.unwrap().unwrap();
        assert_eq!(session.stage(), ConsultationStage::AwaitingClarifyingAnswer);
        assert_eq!(session.primary_symptoms(), ["sore throat"]);
    }

    #[tokio::test]
    async fn oracle_can_recommend_early() {
        let provider = MockAIProvider::new().with_response(ASK).with_response(
            r#"{"action": "recommend_doctor", "specialist": "Otolaryngologist", "urgency": "low", "reasoning": "Throat complaint."}"#,
        );
        let (engine, user) = engine(provider, 3).await;
        engine.handle(&user, UserEvent::text("sore throat")).await.unwrap();

        let reply = engine.handle(&user, UserEvent::text("no fever")).await.unwrap();

        match reply {
            Reply::Completed { record, .. } => {
                assert_eq!(record.recommendation.specialist.as_str(), "Otolaryngologist");
                assert_eq!(record.recommendation.urgency, Urgency::Low);
                match record.details {
                    RecordDetails::QaHistory { qa_history } => {
                        assert_eq!(qa_history.len(), 1);
                        assert_eq!(qa_history[0].answer, "no fever");
                    }
                    other => panic!("unexpected details: {:?}", other),
                }
            }
            other => panic!("unexpected reply: {:?}", other),
        }
        assert!(engine.session(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn round_cap_forces_recommendation() {
        let provider = MockAIProvider::new().with_response(ASK).with_response(
            r#"{"specialist": "Neurologist", "urgency": "medium", "reasoning": "General complaint."}"#,
        );
        let (engine, user) = engine(provider.clone(), 1).await;
        engine.handle(&user, UserEvent::text("tiredness")).await.unwrap();

        let reply = engine.handle(&user, UserEvent::text("two weeks")).await.unwrap();

        assert!(reply.is_completed());
        let operations: Vec<_> = provider
            .get_calls()
            .iter()
            .map(|c| c.metadata.operation)
            .collect();
        assert_eq!(operations, ["assess", "recommend"]);
    }

    #[tokio::test]
    async fn oracle_failure_asks_fallback_question() {
        let provider = MockAIProvider::new().with_error(MockError::Unavailable {
            message: "down".to_string(),
        });
        let (engine, user) = engine(provider, 3).await;

        let reply = engine.handle(&user, UserEvent::text("back pain")).await.unwrap();

        assert_eq!(reply.prompt().unwrap().text, FALLBACK_CLARIFYING_QUESTION);
        let session = engine.session(&user).await.unwrap().unwrap();
        assert_eq!(session.pending_question(), Some(FALLBACK_CLARIFYING_QUESTION));
    }

    #[tokio::test]
    async fn failure_at_cap_falls_back_to_default_specialist() {
        let provider = MockAIProvider::new().with_response(ASK);
        let (engine, user) = engine(provider, 1).await;
        engine.handle(&user, UserEvent::text("back pain")).await.unwrap();

        let reply = engine.handle(&user, UserEvent::text("since monday")).await.unwrap();

        match reply {
            Reply::Completed { record, .. } => {
                assert!(record.recommendation.is_fallback);
                assert_eq!(record.recommendation.urgency, Urgency::Medium);
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }
}
