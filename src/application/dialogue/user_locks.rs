//! Per-user turn locks.
//!
//! Turns from one user run one at a time; turns from different users never
//! wait on each other beyond the brief map lookup.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::UserId;

/// Lazily created mutex per user.
#[derive(Debug, Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn for `user_id` is running.
    ///
    /// The lock is held until the returned guard is dropped.
    pub async fn acquire(&self, user_id: &UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(user_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drops locks nobody holds or waits for. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut locks = self.locks.lock().await;
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    /// Number of users with a lock entry.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
