//! Consultation Recorder Port - persistence of finished consultations.
//!
//! A plain create operation. The engine never lets a recorder failure
//! block the patient's recommendation.

use async_trait::async_trait;

use crate::domain::consultation::ConsultationRecord;

/// Errors from the record sink
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Failed to persist consultation: {0}")]
    PersistFailed(String),
}

/// Port for persisting consultation outcomes
#[async_trait]
pub trait ConsultationRecorder: Send + Sync {
    /// Persist one finished consultation
    async fn record(&self, record: &ConsultationRecord) -> Result<(), RecorderError>;
}
