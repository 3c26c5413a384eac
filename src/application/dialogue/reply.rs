//! What the engine hands back to the presentation layer for one event.

use std::fmt;

use crate::domain::consultation::{ConsultationRecord, MediaKind, Prompt};

/// Input the current stage cannot accept. The stage is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRejection {
    /// Voice and other media are not supported.
    UnsupportedInput(MediaKind),
    /// Text judged not to describe symptoms.
    OffTopic(String),
    /// Blank text, or text with no symptom fragments.
    EmptyInput,
}

impl fmt::Display for InputRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputRejection::UnsupportedInput(kind) => write!(
                f,
                "Sorry, a {} is not supported. Please describe your symptoms in text.",
                kind
            ),
            InputRejection::OffTopic(reason) => write!(
                f,
                "This does not look like a symptom description ({}). Please try again.",
                reason
            ),
            InputRejection::EmptyInput => write!(f, "Please describe your symptoms in words."),
        }
    }
}

/// Result of one user event.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The next prompt of the dialogue (or the same one after a no-op).
    Prompt(Prompt),
    /// The input was refused; `prompt` repeats the current stage.
    Rejected {
        rejection: InputRejection,
        prompt: Prompt,
    },
    /// The user has no profile; nothing was started.
    RegistrationRequired(Prompt),
    /// A recommendation was produced and the session destroyed.
    Completed {
        record: ConsultationRecord,
        prompt: Prompt,
    },
    /// The session was destroyed on request.
    Cancelled(Prompt),
    /// The event needs a consultation and there is none.
    NoActiveSession(Prompt),
    /// The session this turn worked on was cancelled or replaced while the
    /// turn was waiting on the oracle; its result was discarded.
    Superseded,
}

impl Reply {
    /// Prompt to render, if any.
    pub fn prompt(&self) -> Option<&Prompt> {
        match self {
            Reply::Prompt(prompt)
            | Reply::Rejected { prompt, .. }
            | Reply::RegistrationRequired(prompt)
            | Reply::Completed { prompt, .. }
            | Reply::Cancelled(prompt)
            | Reply::NoActiveSession(prompt) => Some(prompt),
            Reply::Superseded => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Reply::Completed { .. })
    }
}
