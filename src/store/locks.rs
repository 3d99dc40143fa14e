//! Per-entity serialization.
//!
//! One mutation flow per task id runs at a time; flows on different ids
//! proceed concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::model::TaskId;

/// Guard held for the whole mutation flow on one entity.
pub type EntityGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct EntityLocks {
    locks: Mutex<HashMap<TaskId, Arc<AsyncMutex<()>>>>,
}

impl EntityLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn acquire(&self, id: &TaskId) -> EntityGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Forget the lock for `id` if nobody holds or waits on it.
    pub fn release_unused(&self, id: &TaskId) {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        if locks.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(id);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_entity_is_serialized() {
        let locks = Arc::new(EntityLocks::new());
        let id = TaskId::new("task-1");
        let guard = locks.acquire(&id).await;

        let locks2 = Arc::clone(&locks);
        let id2 = id.clone();
        let waiter = tokio::spawn(async move {
            let _g = locks2.acquire(&id2).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_entities_are_independent() {
        let locks = EntityLocks::new();
        let _a = locks.acquire(&TaskId::new("a")).await;
        let _b = locks.acquire(&TaskId::new("b")).await;
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_release_unused() {
        let locks = EntityLocks::new();
        let id = TaskId::new("a");
        let guard = locks.acquire(&id).await;
        drop(guard);
        locks.release_unused(&id);
        assert!(locks.is_empty());
    }
}
