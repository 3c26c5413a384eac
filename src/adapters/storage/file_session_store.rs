//! File-based Session Store Adapter
//!
//! Stores each user's live session as one YAML file, so a consultation
//! survives a process restart and resumes at its stage.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::consultation::ConsultationSession;
use crate::domain::foundation::{ConsultationId, UserId};
use crate::ports::{SessionStore, SessionStoreError};

const EXTENSION: &str = "yaml";

/// File-based storage for live sessions
#[derive(Debug)]
pub struct FileSessionStore {
    base_path: PathBuf,
    /// Serializes compare-and-write operations within this process.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Create a new file store with a base directory
    ///
    /// # Example
    /// ```ignore
    /// let store = FileSessionStore::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the session file path for a user
    fn session_file_path(&self, user_id: &UserId) -> PathBuf {
        self.base_path
            .join(format!("{}.{}", encode_file_stem(user_id.as_str()), EXTENSION))
    }

    /// Ensure the base directory exists
    async fn ensure_dir(&self) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))
    }

    async fn read_file(&self, path: &Path) -> Result<Option<ConsultationSession>, SessionStoreError> {
        let yaml = match fs::read_to_string(path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionStoreError::IoError(e.to_string())),
        };

        let session = serde_yaml::from_str(&yaml)
            .map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))?;
        Ok(Some(session))
    }

    /// Writes through a temporary file so readers never see a partial session
    async fn write_file(&self, session: &ConsultationSession) -> Result<(), SessionStoreError> {
        self.ensure_dir().await?;

        let yaml = serde_yaml::to_string(session)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        let path = self.session_file_path(session.user_id());
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))
    }

    async fn remove_file(&self, user_id: &UserId) -> Result<(), SessionStoreError> {
        match fs::remove_file(self.session_file_path(user_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStoreError::IoError(e.to_string())),
        }
    }
}

/// Maps a user id to a safe file stem; bytes outside `[A-Za-z0-9_-]` are
/// hex-escaped.
fn encode_file_stem(raw: &str) -> String {
    let mut stem = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, user_id: &UserId) -> Result<Option<ConsultationSession>, SessionStoreError> {
        self.read_file(&self.session_file_path(user_id)).await
    }

    async fn put(&self, session: &ConsultationSession) -> Result<(), SessionStoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_file(session).await
    }

    async fn put_if_current(&self, session: &ConsultationSession) -> Result<bool, SessionStoreError> {
        let _guard = self.write_lock.lock().await;
        match self.get(session.user_id()).await? {
            Some(stored) if stored.id() == session.id() => {
                self.write_file(session).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), SessionStoreError> {
        let _guard = self.write_lock.lock().await;
        self.remove_file(user_id).await
    }

    async fn clear_if_current(
        &self,
        user_id: &UserId,
        consultation_id: ConsultationId,
    ) -> Result<bool, SessionStoreError> {
        let _guard = self.write_lock.lock().await;
        match self.get(user_id).await? {
            Some(stored) if stored.id() == consultation_id => {
                self.remove_file(user_id).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<ConsultationSession>, SessionStoreError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SessionStoreError::IoError(e.to_string())),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match self.read_file(&path).await {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable session file"),
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::consultation::{ConsultationStage, PatientProfile, WorkflowMode};
    use tempfile::TempDir;

    fn session(user: &str) -> ConsultationSession {
        ConsultationSession::start(
            UserId::new(user).unwrap(),
            PatientProfile::default(),
            WorkflowMode::Fixed,
        )
    }

    #[tokio::test]
    async fn session_survives_a_new_store_instance() {
        let dir = TempDir::new().unwrap();
        let mut s = session("alice");
        s.add_primary_symptoms(vec!["headache".to_string()]);
        s.advance_to(ConsultationStage::ConfirmingSymptoms).unwrap();

        FileSessionStore::new(dir.path()).put(&s).await.unwrap();
        let reopened = FileSessionStore::new(dir.path());
        let loaded = reopened.get(s.user_id()).await.unwrap().unwrap();

        assert_eq!(loaded, s);
        assert_eq!(loaded.stage(), ConsultationStage::ConfirmingSymptoms);
    }

    #[tokio::test]
    async fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("not-created-yet"));
        let user = UserId::new("bob").unwrap();
        assert!(store.get(&user).await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conditional_writes_compare_consultation_ids() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        let stale = session("alice");
        let fresh = session("alice");
        store.put(&fresh).await.unwrap();

        assert!(!store.put_if_current(&stale).await.unwrap());
        assert!(!store.clear_if_current(stale.user_id(), stale.id()).await.unwrap());
        assert!(store.put_if_current(&fresh).await.unwrap());
        assert!(store.clear_if_current(fresh.user_id(), fresh.id()).await.unwrap());
        assert!(store.get(fresh.user_id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.clear(&UserId::new("ghost").unwrap()).await.unwrap();
    }

    #[tokio::test]
    async fn list_skips_foreign_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.put(&session("alice")).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("broken.yaml"), ": : :").unwrap();

        let sessions = store.list().await.unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn file_stems_are_escaped() {
        assert_eq!(encode_file_stem("tg-12345"), "tg-12345");
        assert_eq!(encode_file_stem("../etc/passwd"), "%2E%2E%2Fetc%2Fpasswd");
    }
}
