//! Persisted outcome of a finished consultation.

use serde::{Deserialize, Serialize};

use super::duration::SymptomDuration;
use super::recommendation::Recommendation;
use super::session::{ConsultationSession, QaPair};
use crate::domain::foundation::{ConsultationId, Timestamp, UserId};

/// Workflow-specific part of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetails {
    /// Fixed workflow: how long the symptoms lasted.
    Duration { duration: Option<SymptomDuration> },
    /// Adaptive workflow: the clarifying questions and answers.
    QaHistory { qa_history: Vec<QaPair> },
}

/// What the recorder persists once a recommendation is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub consultation_id: ConsultationId,
    pub user_id: UserId,
    /// Primary symptoms followed by selected additional symptoms.
    pub symptoms: Vec<String>,
    pub details: RecordDetails,
    pub recommendation: Recommendation,
    pub created_at: Timestamp,
}

impl ConsultationRecord {
    /// Builds the record for a session that just received `recommendation`.
    pub fn from_session(session: &ConsultationSession, recommendation: Recommendation) -> Self {
        let details = if session.qa_history().is_empty() {
            RecordDetails::Duration {
                duration: session.duration(),
            }
        } else {
            RecordDetails::QaHistory {
                qa_history: session.qa_history().to_vec(),
            }
        };

        Self {
            consultation_id: session.id(),
            user_id: session.user_id().clone(),
            symptoms: session.all_symptoms(),
            details,
            recommendation,
            created_at: Timestamp::now(),
        }
    }

    /// Duration label, if the record carries one.
    pub fn duration_label(&self) -> Option<&'static str> {
        match &self.details {
            RecordDetails::Duration { duration } => duration.map(|d| d.label()),
            RecordDetails::QaHistory { .. } => None,
        }
    }
}
