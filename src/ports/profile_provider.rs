//! Profile Provider Port - read access to registered patient profiles.
//!
//! Registration lives outside the dialogue; a missing profile blocks entry
//! to a consultation.

use async_trait::async_trait;

use crate::domain::consultation::PatientProfile;
use crate::domain::foundation::UserId;

/// Errors from the profile source
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile source unavailable: {0}")]
    Unavailable(String),
}

/// Port for looking up patient profiles
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Returns the profile, or `None` if the user never registered
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<PatientProfile>, ProfileError>;
}
