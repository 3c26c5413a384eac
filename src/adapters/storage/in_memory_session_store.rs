//! In-Memory Session Store Adapter
//!
//! Keeps live consultation sessions in a process-local map.
//! The default backend; sessions are lost on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::consultation::ConsultationSession;
use crate::domain::foundation::{ConsultationId, UserId};
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory storage for live sessions
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<UserId, ConsultationSession>>>,
}

impl InMemorySessionStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<ConsultationSession>, SessionStoreError> {
        Ok(self.sessions.read().await.get(user_id).cloned())
    }

    async fn put(&self, session: &ConsultationSession) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(session.user_id().clone(), session.clone());
        Ok(())
    }

    async fn put_if_current(&self, session: &ConsultationSession) -> Result<bool, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session.user_id()) {
            Some(stored) if stored.id() == session.id() => {
                *stored = session.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(user_id);
        Ok(())
    }

    async fn clear_if_current(
        &self,
        user_id: &UserId,
        consultation_id: ConsultationId,
    ) -> Result<bool, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(user_id) {
            Some(stored) if stored.id() == consultation_id => {
                sessions.remove(user_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<ConsultationSession>, SessionStoreError> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consultation::{PatientProfile, WorkflowMode};

    fn session(user: &str) -> ConsultationSession {
        ConsultationSession::start(
            UserId::new(user).unwrap(),
            PatientProfile::default(),
            WorkflowMode::Fixed,
        )
    }

    #[tokio::test]
    async fn put_then_get_returns_session() {
        let store = InMemorySessionStore::new();
        let s = session("alice");
        store.put(&s).await.unwrap();

        let loaded = store.get(s.user_id()).await.unwrap().unwrap();
        assert_eq!(loaded.id(), s.id());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = InMemorySessionStore::new();
        let user = UserId::new("nobody").unwrap();
        assert!(store.get(&user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_previous_session_for_user() {
        let store = InMemorySessionStore::new();
        let first = session("alice");
        let second = session("alice");
        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        let loaded = store.get(first.user_id()).await.unwrap().unwrap();
        assert_eq!(loaded.id(), second.id());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn put_if_current_rejects_stale_session() {
        let store = InMemorySessionStore::new();
        let stale = session("alice");
        let fresh = session("alice");
        store.put(&fresh).await.unwrap();

        assert!(!store.put_if_current(&stale).await.unwrap());
        let loaded = store.get(fresh.user_id()).await.unwrap().unwrap();
        assert_eq!(loaded.id(), fresh.id());
    }

    #[tokio::test]
    async fn put_if_current_rejects_cleared_session() {
        let store = InMemorySessionStore::new();
        let s = session("alice");
        store.put(&s).await.unwrap();
        store.clear(s.user_id()).await.unwrap();

        assert!(!store.put_if_current(&s).await.unwrap());
        assert!(store.get(s.user_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_if_current_only_removes_matching_consultation() {
        let store = InMemorySessionStore::new();
        let s = session("alice");
        store.put(&s).await.unwrap();

        assert!(!store
            .clear_if_current(s.user_id(), ConsultationId::new())
            .await
            .unwrap());
        assert!(store.clear_if_current(s.user_id(), s.id()).await.unwrap());
        assert!(store.get(s.user_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = InMemorySessionStore::new();
        let a = session("alice");
        let b = session("bob");
        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();
        store.clear(a.user_id()).await.unwrap();

        assert!(store.get(b.user_id()).await.unwrap().is_some());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }
}
