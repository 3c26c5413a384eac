//! Inbound user events and choice tokens.
//!
//! The presentation layer turns whatever the patient did into a
//! [`UserEvent`]; button presses carry a structured [`ChoiceToken`] so a
//! suggestion is identified by its index, never by its (possibly truncated)
//! text.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::duration::SymptomDuration;

/// Kind of non-text media the patient sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Voice,
    Photo,
    Video,
    Document,
    Sticker,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaKind::Voice => "voice message",
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::Sticker => "sticker",
        };
        write!(f, "{}", s)
    }
}

/// Opaque choice identifier handed to the presentation layer with a prompt
/// and returned when the patient picks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "choice", content = "value", rename_all = "snake_case")]
pub enum ChoiceToken {
    /// Begin a new consultation, replacing any live one.
    StartConsultation,
    /// Abandon the consultation.
    Cancel,
    /// Accept what is shown and move on.
    Confirm,
    /// Add more symptoms before continuing.
    AddMore,
    /// Clear everything and describe symptoms again.
    Restart,
    /// Return to the previous stage.
    Back,
    /// Pick a duration bucket.
    Duration(SymptomDuration),
    /// Select or deselect the suggestion at this index.
    ToggleSuggestion(usize),
    /// None of the suggestions apply.
    NoneOfThese,
    /// Enter a symptom that is not among the suggestions.
    Other,
    /// Finish selecting additional symptoms.
    Done,
}

/// Everything the engine can receive from a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum UserEvent {
    TextInput(String),
    ButtonChoice(ChoiceToken),
    MediaInput(MediaKind),
}

impl UserEvent {
    pub fn text(text: impl Into<String>) -> Self {
        UserEvent::TextInput(text.into())
    }

    pub fn choice(token: ChoiceToken) -> Self {
        UserEvent::ButtonChoice(token)
    }

    /// Short name used in logs; never includes patient text.
    pub fn kind(&self) -> &'static str {
        match self {
            UserEvent::TextInput(_) => "text",
            UserEvent::ButtonChoice(_) => "choice",
            UserEvent::MediaInput(_) => "media",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_tokens_serialize_with_payload() {
        let json = serde_json::to_string(&ChoiceToken::ToggleSuggestion(3)).unwrap();
        assert_eq!(json, r#"{"choice":"toggle_suggestion","value":3}"#);

        let json = serde_json::to_string(&ChoiceToken::Duration(SymptomDuration::MoreThanWeek))
            .unwrap();
        assert_eq!(json, r#"{"choice":"duration","value":"more_than_week"}"#);
    }

    #[test]
    fn unit_tokens_round_trip() {
        let token: ChoiceToken = serde_json::from_str(r#"{"choice":"none_of_these"}"#).unwrap();
        assert_eq!(token, ChoiceToken::NoneOfThese);
    }

    #[test]
    fn event_kind_hides_content() {
        assert_eq!(UserEvent::text("chest pain").kind(), "text");
        assert_eq!(UserEvent::MediaInput(MediaKind::Voice).kind(), "media");
    }
}
