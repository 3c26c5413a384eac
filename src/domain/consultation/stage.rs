//! Consultation stage machine.
//!
//! Two workflows share one stage enum:
//! - the fixed pipeline walks symptoms, duration, oracle suggestions and a
//!   final confirmation in a deterministic order;
//! - the adaptive pipeline loops on oracle-chosen clarifying questions.
//!
//! Completion is not a stage: a finished consultation is removed from the
//! store instead.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Which dialogue the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowMode {
    /// Deterministic stage order; the oracle only suggests symptoms.
    #[default]
    Fixed,
    /// The oracle decides every turn whether to ask or to recommend.
    Adaptive,
}

/// Current position in the consultation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStage {
    /// Waiting for the initial free-text description.
    #[default]
    CollectingSymptoms,
    /// Showing the parsed symptom list for confirmation.
    ConfirmingSymptoms,
    /// Waiting for extra free-text symptoms before re-confirming.
    AddingSymptoms,
    /// Waiting for a duration choice.
    SelectingDuration,
    /// Oracle suggestion call in flight.
    GeneratingSuggestions,
    /// Patient toggles oracle-suggested symptoms.
    SelectingAdditionalSymptoms,
    /// Waiting for a free-text symptom outside the suggestions.
    EnteringCustomSymptom,
    /// Showing the full anamnesis before the recommendation.
    FinalConfirmation,
    /// Adaptive pipeline: waiting for the answer to an oracle question.
    AwaitingClarifyingAnswer,
}

impl ConsultationStage {
    /// True if the stage consumes free text rather than button choices.
    pub fn expects_text(&self) -> bool {
        matches!(
            self,
            Self::CollectingSymptoms
                | Self::AddingSymptoms
                | Self::EnteringCustomSymptom
                | Self::AwaitingClarifyingAnswer
        )
    }
}

impl StateMachine for ConsultationStage {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConsultationStage::*;
        match self {
            CollectingSymptoms => vec![ConfirmingSymptoms, AwaitingClarifyingAnswer],
            // confirm, add more, restart
            ConfirmingSymptoms => vec![SelectingDuration, AddingSymptoms, CollectingSymptoms],
            AddingSymptoms => vec![ConfirmingSymptoms],
            SelectingDuration => vec![GeneratingSuggestions, ConfirmingSymptoms],
            // empty suggestions skip straight to the final confirmation
            GeneratingSuggestions => vec![SelectingAdditionalSymptoms, FinalConfirmation],
            SelectingAdditionalSymptoms => {
                vec![EnteringCustomSymptom, FinalConfirmation, SelectingDuration]
            }
            EnteringCustomSymptom => vec![SelectingAdditionalSymptoms],
            FinalConfirmation => {
                vec![SelectingAdditionalSymptoms, SelectingDuration, CollectingSymptoms]
            }
            AwaitingClarifyingAnswer => vec![AwaitingClarifyingAnswer],
        }
    }
}
