//! Prompts handed to the presentation layer.
//!
//! A prompt is plain text plus an ordered set of choices. How the choices
//! are drawn (buttons, numbered lines) is up to the presentation layer.

use serde::{Deserialize, Serialize};

use super::duration::SymptomDuration;
use super::event::ChoiceToken;
use super::recommendation::Recommendation;
use super::session::ConsultationSession;
use super::stage::{ConsultationStage, WorkflowMode};

/// Disclaimer appended to every recommendation.
pub const DISCLAIMER: &str =
    "This is not a diagnosis. Only a doctor can diagnose you after an examination.";

/// Question asked when the oracle cannot provide one in the adaptive workflow.
pub const FALLBACK_CLARIFYING_QUESTION: &str =
    "Please describe your symptoms in more detail: when did they start and how severe are they?";

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub token: ChoiceToken,
    pub label: String,
}

/// Text plus the choices valid at this point of the dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub choices: Vec<Choice>,
}

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
        }
    }

    /// Appends a choice.
    pub fn with_choice(mut self, token: ChoiceToken, label: impl Into<String>) -> Self {
        self.choices.push(Choice {
            token,
            label: label.into(),
        });
        self
    }

    /// True if `token` is one of the offered choices.
    pub fn offers(&self, token: &ChoiceToken) -> bool {
        self.choices.iter().any(|c| c.token == *token)
    }

    fn with_cancel(self) -> Self {
        self.with_choice(ChoiceToken::Cancel, "Cancel")
    }
}

/// Shown when there is no live consultation.
pub fn idle_prompt() -> Prompt {
    Prompt::new("Press \"Start consultation\" to describe your symptoms.")
        .with_choice(ChoiceToken::StartConsultation, "Start consultation")
}

/// Shown when the patient has no profile yet.
pub fn registration_required_prompt() -> Prompt {
    Prompt::new("Please complete registration first: we need your profile to give a recommendation.")
}

/// Shown after a cancellation.
pub fn cancelled_prompt() -> Prompt {
    Prompt::new("Consultation cancelled.")
        .with_choice(ChoiceToken::StartConsultation, "Start consultation")
}

/// Final answer of a consultation.
pub fn recommendation_prompt(recommendation: &Recommendation) -> Prompt {
    let text = format!(
        "Recommended specialist: {}\nUrgency: {}\n\n{}\n\n{}",
        recommendation.specialist,
        recommendation.urgency.advice(),
        recommendation.reasoning,
        DISCLAIMER
    );
    Prompt::new(text).with_choice(ChoiceToken::StartConsultation, "New consultation")
}

/// Prompt for the session's current stage.
pub fn stage_prompt(session: &ConsultationSession) -> Prompt {
    use ConsultationStage::*;

    match session.stage() {
        CollectingSymptoms => {
            if session.workflow() == WorkflowMode::Adaptive {
                Prompt::new("Describe what bothers you in a few words.").with_cancel()
            } else {
                Prompt::new(
                    "Describe your main symptoms, separated by commas (for example: headache, nausea).",
                )
                .with_cancel()
            }
        }
        ConfirmingSymptoms => Prompt::new(format!(
            "Your symptoms: {}\n\nIs that correct?",
            session.primary_symptoms().join(", ")
        ))
        .with_choice(ChoiceToken::Confirm, "Confirm")
        .with_choice(ChoiceToken::AddMore, "Add details")
        .with_choice(ChoiceToken::Restart, "Start over")
        .with_cancel(),
        AddingSymptoms => Prompt::new("What else would you like to add?").with_cancel(),
        SelectingDuration => {
            let mut prompt = Prompt::new("How long have you had these symptoms?");
            for duration in SymptomDuration::ALL {
                prompt = prompt.with_choice(ChoiceToken::Duration(duration), duration.label());
            }
            prompt.with_choice(ChoiceToken::Back, "Back").with_cancel()
        }
        GeneratingSuggestions => {
            Prompt::new("Analysing your symptoms, please wait...").with_cancel()
        }
        SelectingAdditionalSymptoms => {
            let mut prompt = Prompt::new(
                "Do you also have any of these symptoms? Tap to select or deselect.",
            );
            for (index, symptom) in session.suggested_symptoms().iter().enumerate() {
                let mark = if session.is_suggestion_selected(index) {
                    "[x]"
                } else {
                    "[ ]"
                };
                prompt = prompt.with_choice(
                    ChoiceToken::ToggleSuggestion(index),
                    format!("{} {}", mark, symptom),
                );
            }
            prompt
                .with_choice(ChoiceToken::NoneOfThese, "None of these")
                .with_choice(ChoiceToken::Other, "Other (describe)")
                .with_choice(ChoiceToken::Done, "Done")
                .with_choice(ChoiceToken::Back, "Back")
                .with_cancel()
        }
        EnteringCustomSymptom => Prompt::new("Describe the other symptom.").with_cancel(),
        FinalConfirmation => Prompt::new(format!(
            "{}\n\nGet a recommendation?",
            anamnesis(session)
        ))
        .with_choice(ChoiceToken::Confirm, "Get recommendation")
        .with_choice(ChoiceToken::AddMore, "Add more symptoms")
        .with_choice(ChoiceToken::Back, "Change duration")
        .with_choice(ChoiceToken::Restart, "Start over")
        .with_cancel(),
        AwaitingClarifyingAnswer => Prompt::new(
            session
                .pending_question()
                .unwrap_or(FALLBACK_CLARIFYING_QUESTION)
                .to_string(),
        )
        .with_cancel(),
    }
}

/// Accumulated anamnesis shown before the recommendation.
pub fn anamnesis(session: &ConsultationSession) -> String {
    let mut lines = vec![
        "Your anamnesis:".to_string(),
        format!("Main symptoms: {}", session.primary_symptoms().join(", ")),
    ];

    if let Some(duration) = session.duration() {
        lines.push(format!("Duration: {}", duration.label()));
    }

    let selected = session.selected_symptoms();
    if selected.is_empty() {
        lines.push("Additional symptoms: none".to_string());
    } else {
        lines.push(format!("Additional symptoms: {}", selected.join(", ")));
    }

    for pair in session.qa_history() {
        lines.push(format!("Q: {}\nA: {}", pair.question, pair.answer));
    }

    lines.join("\n")
}
