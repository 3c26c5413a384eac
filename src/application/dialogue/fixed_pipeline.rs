//! Fixed-stage workflow: the patient walks a deterministic stage order and
//! the oracle only suggests additional symptoms and gives the final answer.

use tracing::{debug, warn};

use super::engine::{DialogueEngine, EngineError, Step};
use super::reply::InputRejection;
use crate::domain::consultation::{
    ChoiceToken, ConsultationSession, ConsultationStage, SymptomDuration, UserEvent,
};

impl DialogueEngine {
    pub(super) async fn fixed_step(
        &self,
        session: &mut ConsultationSession,
        event: UserEvent,
    ) -> Result<Step, EngineError> {
        use ConsultationStage::*;

        let step = match (session.stage(), event) {
            (CollectingSymptoms | AddingSymptoms, UserEvent::TextInput(text)) => {
                let validate = self.settings.validate_primary_symptoms;
                match self.read_symptoms(session, &text, validate).await {
                    Ok(symptoms) => {
                        session.add_primary_symptoms(symptoms);
                        session.advance_to(ConfirmingSymptoms)?;
                        Step::Save
                    }
                    Err(rejection) => Step::Reject(rejection),
                }
            }

            (ConfirmingSymptoms, UserEvent::ButtonChoice(ChoiceToken::Confirm)) => {
                session.advance_to(SelectingDuration)?;
                Step::Save
            }
            (ConfirmingSymptoms, UserEvent::ButtonChoice(ChoiceToken::AddMore)) => {
                session.advance_to(AddingSymptoms)?;
                Step::Save
            }
            (ConfirmingSymptoms | FinalConfirmation, UserEvent::ButtonChoice(ChoiceToken::Restart)) => {
                session.restart()?;
                Step::Save
            }

            (SelectingDuration, UserEvent::ButtonChoice(ChoiceToken::Duration(duration))) => {
                return self.generate_suggestions(session, duration).await;
            }
            (SelectingDuration, UserEvent::ButtonChoice(ChoiceToken::Back)) => {
                session.advance_to(ConfirmingSymptoms)?;
                Step::Save
            }

            (SelectingAdditionalSymptoms, UserEvent::ButtonChoice(ChoiceToken::ToggleSuggestion(index))) => {
                match session.toggle_suggestion(index) {
                    Ok(_) => Step::Save,
                    Err(_) => Step::Ignore,
                }
            }
            (SelectingAdditionalSymptoms, UserEvent::ButtonChoice(ChoiceToken::NoneOfThese)) => {
                session.clear_selection();
                session.advance_to(FinalConfirmation)?;
                Step::Save
            }
            (SelectingAdditionalSymptoms, UserEvent::ButtonChoice(ChoiceToken::Other)) => {
                session.advance_to(EnteringCustomSymptom)?;
                Step::Save
            }
            (SelectingAdditionalSymptoms, UserEvent::ButtonChoice(ChoiceToken::Done)) => {
                session.advance_to(FinalConfirmation)?;
                Step::Save
            }
            (SelectingAdditionalSymptoms | FinalConfirmation, UserEvent::ButtonChoice(ChoiceToken::Back)) => {
                session.advance_to(SelectingDuration)?;
                Step::Save
            }

            (EnteringCustomSymptom, UserEvent::TextInput(text)) => {
                self.enter_custom_symptoms(session, &text).await?
            }

            (FinalConfirmation, UserEvent::ButtonChoice(ChoiceToken::Confirm)) => {
                Step::Complete(self.recommend_or_fallback(session).await)
            }
            (FinalConfirmation, UserEvent::ButtonChoice(ChoiceToken::AddMore)) => {
                session.advance_to(SelectingAdditionalSymptoms)?;
                Step::Save
            }

            _ => Step::Ignore,
        };
        Ok(step)
    }

    /// Records the duration and fetches suggestions.
    ///
    /// The session is written in `GeneratingSuggestions` before the oracle
    /// call, so a cancel during the call is visible when it returns. Any
    /// oracle failure continues with no suggestions.
    async fn generate_suggestions(
        &self,
        session: &mut ConsultationSession,
        duration: SymptomDuration,
    ) -> Result<Step, EngineError> {
        session.set_duration(duration);
        session.advance_to(ConsultationStage::GeneratingSuggestions)?;
        if !self.checkpoint(session).await? {
            return Ok(Step::Superseded);
        }

        let suggestions = match self.gateway.generate_additional_symptoms(session).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(
                    user_id = %session.user_id(),
                    consultation_id = %session.id(),
                    error = %e,
                    "Suggestion generation failed, continuing without suggestions"
                );
                Vec::new()
            }
        };

        session.replace_suggestions(suggestions);
        if session.suggested_symptoms().is_empty() {
            session.advance_to(ConsultationStage::FinalConfirmation)?;
        } else {
            session.advance_to(ConsultationStage::SelectingAdditionalSymptoms)?;
        }
        Ok(Step::Save)
    }

    /// Validates free-text extra symptoms and adds them to the selection.
    async fn enter_custom_symptoms(
        &self,
        session: &mut ConsultationSession,
        text: &str,
    ) -> Result<Step, EngineError> {
        let symptoms = match self.read_symptoms(session, text, true).await {
            Ok(symptoms) => symptoms,
            Err(rejection) => return Ok(Step::Reject(rejection)),
        };

        let added = session.add_custom_symptoms(symptoms);
        if added.is_empty() {
            debug!(
                user_id = %session.user_id(),
                "Custom symptoms already known, nothing added"
            );
        }
        session.advance_to(ConsultationStage::SelectingAdditionalSymptoms)?;
        Ok(Step::Save)
    }
}
