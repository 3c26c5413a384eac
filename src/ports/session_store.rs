//! Session Store Port - Interface for the per-user consultation session map.
//!
//! Exactly one live session per user. Turns for one user are serialized by
//! the dialogue engine, so implementations only need per-key consistency:
//! a `get` observes the latest `put` for the same user.
//!
//! The conditional operations compare the stored session's
//! [`ConsultationId`] with the caller's. A turn that ran while its session
//! was cancelled or replaced finds a different id (or none) and its write
//! is dropped.

use async_trait::async_trait;

use crate::domain::consultation::ConsultationSession;
use crate::domain::foundation::{ConsultationId, UserId};

/// Errors that can occur during session store operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize session: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for storing live consultation sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the live session for a user, if any
    async fn get(&self, user_id: &UserId) -> Result<Option<ConsultationSession>, SessionStoreError>;

    /// Store a session, replacing whatever the user had
    async fn put(&self, session: &ConsultationSession) -> Result<(), SessionStoreError>;

    /// Store a session only if the user's stored session has the same id
    ///
    /// # Returns
    /// `false` if the stored session is missing or belongs to another
    /// consultation; nothing is written in that case
    async fn put_if_current(&self, session: &ConsultationSession) -> Result<bool, SessionStoreError>;

    /// Remove the user's session unconditionally
    async fn clear(&self, user_id: &UserId) -> Result<(), SessionStoreError>;

    /// Remove the user's session only if it is the given consultation
    ///
    /// # Returns
    /// `true` if a session was removed
    async fn clear_if_current(
        &self,
        user_id: &UserId,
        consultation_id: ConsultationId,
    ) -> Result<bool, SessionStoreError>;

    /// All stored sessions, for idle sweeping
    async fn list(&self) -> Result<Vec<ConsultationSession>, SessionStoreError>;
}
