//! In-memory consultation recorder.
//!
//! Keeps finished consultations in a vector. Can be switched into a failing
//! mode to exercise the engine's recorder-failure path.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::consultation::ConsultationRecord;
use crate::domain::foundation::UserId;
use crate::ports::{ConsultationRecorder, RecorderError};

/// Records held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryConsultationRecorder {
    records: Arc<RwLock<Vec<ConsultationRecord>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryConsultationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `record` call fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All records, oldest first
    pub async fn records(&self) -> Vec<ConsultationRecord> {
        self.records.read().await.clone()
    }

    /// Records belonging to one user
    pub async fn records_for(&self, user_id: &UserId) -> Vec<ConsultationRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ConsultationRecorder for InMemoryConsultationRecorder {
    async fn record(&self, record: &ConsultationRecord) -> Result<(), RecorderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecorderError::PersistFailed("recorder offline".to_string()));
        }

        info!(
            consultation_id = %record.consultation_id,
            specialist = %record.recommendation.specialist,
            urgency = %record.recommendation.urgency,
            "Consultation recorded"
        );
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
