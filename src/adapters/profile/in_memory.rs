//! In-memory profile provider.
//!
//! Stands in for the registration store in tests and the console runner.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::consultation::PatientProfile;
use crate::domain::foundation::UserId;
use crate::ports::{ProfileError, ProfileProvider};

/// Profiles held in a process-local map
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileProvider {
    profiles: Arc<RwLock<HashMap<UserId, PatientProfile>>>,
}

impl InMemoryProfileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a user's profile
    pub async fn insert(&self, user_id: UserId, profile: PatientProfile) {
        self.profiles.write().await.insert(user_id, profile);
    }

    /// Removes a user's profile
    pub async fn remove(&self, user_id: &UserId) {
        self.profiles.write().await.remove(user_id);
    }
}

#[async_trait]
impl ProfileProvider for InMemoryProfileProvider {
    async fn get_profile(&self, user_id: &UserId) -> Result<Option<PatientProfile>, ProfileError> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}
