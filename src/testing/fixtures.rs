//! Test fixtures for store and pipeline tests.
//!
//! Provides a store wired to a mock remote, optionally backed by a
//! temporary queue directory, plus sample data builders.

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use super::mocks::MockRemoteStore;
use crate::config::StoreConfig;
use crate::model::{NewTaskInput, Task, TaskCandidate, TaskId};
use crate::store::OptimisticTaskStore;

/// A store, its mock remote and (optionally) the directory holding its
/// queue file. The directory is cleaned up when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = StoreFixture::with_tasks(sample_tasks(3));
/// fixture.store.set_online(false);
/// ```
pub struct StoreFixture {
    pub remote: Arc<MockRemoteStore>,
    pub store: Arc<OptimisticTaskStore>,
    queue_dir: Option<TempDir>,
}

impl StoreFixture {
    /// Online store over an empty remote.
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be opened.
    #[must_use]
    pub fn new() -> Self {
        Self::from_remote(MockRemoteStore::new())
    }

    /// Store whose remote and cache both hold `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let fixture = Self::from_remote(MockRemoteStore::new().with_tasks(tasks.clone()));
        fixture.store.hydrate(tasks).expect("Failed to hydrate store");
        fixture
    }

    /// Store over a preconfigured remote.
    #[must_use]
    pub fn from_remote(remote: MockRemoteStore) -> Self {
        let remote = Arc::new(remote);
        let store = OptimisticTaskStore::open("user-1", remote.clone(), &StoreConfig::default())
            .expect("Failed to open store");
        Self {
            remote,
            store: Arc::new(store),
            queue_dir: None,
        }
    }

    /// Store whose queue is persisted to a temporary directory.
    #[must_use]
    pub fn persistent() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let remote = Arc::new(MockRemoteStore::new());
        let config = StoreConfig::default().with_queue_dir(temp_dir.path());
        let store =
            OptimisticTaskStore::open("user-1", remote.clone(), &config).expect("Failed to open store");
        Self {
            remote,
            store: Arc::new(store),
            queue_dir: Some(temp_dir),
        }
    }

    /// Open a second session over the same remote and queue directory.
    #[must_use]
    pub fn reopen(&self) -> Arc<OptimisticTaskStore> {
        let mut config = StoreConfig::default();
        if let Some(dir) = &self.queue_dir {
            config = config.with_queue_dir(dir.path());
        }
        Arc::new(
            OptimisticTaskStore::open("user-1", self.remote.clone(), &config)
                .expect("Failed to reopen store"),
        )
    }
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Confirmed tasks `task-100`, `task-101`, ... with distinct creation times.
#[must_use]
pub fn sample_tasks(count: usize) -> Vec<Task> {
    let base = Utc
        .with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    (0..count)
        .map(|i| {
            let offset = i64::try_from(i).expect("small index");
            Task::from_input(
                TaskId::new(format!("task-{}", 100 + i)),
                &NewTaskInput::titled(format!("Sample task {i}")),
                base + Duration::minutes(offset),
            )
        })
        .collect()
}

/// A mixed candidate batch covering every timeframe.
#[must_use]
pub fn sample_candidates() -> Vec<TaskCandidate> {
    vec![
        TaskCandidate::new("Buy milk", "today"),
        TaskCandidate::new("Call the dentist", "tomorrow"),
        TaskCandidate::new("Draft the quarterly project plan for the team offsite", "this week"),
        TaskCandidate::new("Learn Italian", "someday"),
        TaskCandidate::new("Email Sam about the invoice", "next month").with_person_name(),
    ]
}
