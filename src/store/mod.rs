//! Optimistic task store.
//!
//! Every mutation is applied to the local cache first, then either sent to
//! the [`RemoteTaskStore`] directly or appended to the [`OfflineQueue`].
//! Remote failures restore the entity exactly as it was before the
//! mutation; remote success reconciles the cache with the server record and
//! publishes a [`TaskEvent`].
//!
//! # Locking
//!
//! Each flow holds the per-entity lock from [`EntityLocks`] for its whole
//! duration, so at most one create/update/delete is in flight per task id.
//! Synchronous locks are always taken in the order cache, then ledger, then
//! queue, and are never held across an `.await`.

pub mod cache;
pub mod connectivity;
pub mod events;
pub mod locks;
pub mod remote;

pub use cache::CachedTask;
pub use connectivity::Connectivity;
pub use events::{EventBus, TaskEvent, TaskEventKind};
pub use locks::{EntityGuard, EntityLocks};
pub use remote::{RemoteResult, RemoteTaskStore};

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{RemoteError, Result, TaskstreamError};
use crate::model::{NewTaskInput, Task, TaskId, TaskPatch};
use crate::queue::{
    BatchRoute, DrainReport, MutationKind, MutationLedger, MutationPayload, MutationState,
    OfflineQueue, QueuePersistence, QueuedMutation, ReplayHandler, Route,
};
use cache::{CacheEntry, EntitySnapshot, TaskCache};

/// Optimistic, offline-capable task store for one user session.
pub struct OptimisticTaskStore {
    user_id: String,
    remote: Arc<dyn RemoteTaskStore>,
    cache: Mutex<TaskCache>,
    ledger: Mutex<MutationLedger>,
    locks: EntityLocks,
    queue: OfflineQueue,
    events: EventBus,
    connectivity: Connectivity,
    closed: AtomicBool,
}

impl std::fmt::Debug for OptimisticTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticTaskStore")
            .field("user_id", &self.user_id)
            .field("cached", &self.len())
            .field("queued", &self.queue.len())
            .field("online", &self.is_online())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl OptimisticTaskStore {
    /// Open a session for `user_id`.
    ///
    /// When `config.queue_dir` is set, mutations left over from an earlier
    /// session are restored into the queue.
    pub fn open(
        user_id: impl Into<String>,
        remote: Arc<dyn RemoteTaskStore>,
        config: &StoreConfig,
    ) -> Result<Self> {
        config.validate()?;
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(TaskstreamError::validation("user_id", "must not be empty"));
        }

        let queue = match &config.queue_dir {
            Some(dir) => OfflineQueue::open(
                QueuePersistence::new(dir, user_id.clone()),
                user_id.clone(),
                config.max_replay_attempts,
            )?,
            None => OfflineQueue::in_memory(user_id.clone(), config.max_replay_attempts),
        };

        info!(user_id = %user_id, pending = queue.len(), "Opened task store session");

        Ok(Self {
            user_id,
            remote,
            cache: Mutex::new(TaskCache::default()),
            ledger: Mutex::new(MutationLedger::new()),
            locks: EntityLocks::new(),
            queue,
            events: EventBus::new(config.event_capacity),
            connectivity: Connectivity::default(),
            closed: AtomicBool::new(false),
        })
    }

    /// End the session: flush the queue and discard every user-scoped state.
    ///
    /// Later calls are no-ops.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.cache().clear();
        self.ledger().clear();
        let flushed = self.queue.flush();
        self.connectivity.wake();
        info!(user_id = %self.user_id, "Closed task store session");
        flushed
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(TaskstreamError::SessionClosed);
        }
        Ok(())
    }

    fn cache(&self) -> MutexGuard<'_, TaskCache> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn ledger(&self) -> MutexGuard<'_, MutationLedger> {
        self.ledger.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// The cache, unless the session has been closed.
    ///
    /// Remote responses that arrive after `close()` go through here so they
    /// never repopulate a closed session. The flag is read under the cache
    /// lock, so `close()` either sees the change or clears it.
    fn live_cache(&self) -> Option<MutexGuard<'_, TaskCache>> {
        let cache = self.cache();
        (!self.is_closed()).then_some(cache)
    }

    fn transition(&self, mutation_id: Uuid, target: MutationState) {
        if !self.is_closed() {
            self.ledger().transition(mutation_id, target);
        }
    }

    // =========================================================================
    // Session state
    // =========================================================================

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Receive confirmed events. Optimistic changes never appear here.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Record a connectivity change. Returns whether it changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.connectivity.set_online(online);
        if changed {
            info!(online, "Connectivity changed");
        }
        changed
    }

    /// Drain the queue every time connectivity comes back, until the
    /// session is closed.
    pub async fn watch_connectivity(self: Arc<Self>) {
        let mut rx = self.connectivity.subscribe();
        loop {
            if self.is_closed() {
                break;
            }
            let online = *rx.borrow_and_update();
            if online && !self.queue.is_empty() {
                self.drain().await;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
        debug!(user_id = %self.user_id, "Connectivity watcher stopped");
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current view, sorted by creation time.
    #[must_use]
    pub fn tasks(&self) -> Vec<CachedTask> {
        self.cache().tasks()
    }

    /// Look up a task by id. Temporary ids of confirmed creates still work.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<CachedTask> {
        let cache = self.cache();
        let id = cache.resolve(id);
        cache.get(&id).map(|entry| entry.current.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn revision(&self, id: &TaskId) -> Option<u64> {
        self.get(id).map(|cached| cached.revision)
    }

    /// The id `id` is currently cached under.
    #[must_use]
    pub fn resolve_id(&self, id: &TaskId) -> TaskId {
        self.cache().resolve(id)
    }

    /// Queued mutations in replay order.
    #[must_use]
    pub fn pending_mutations(&self) -> Vec<QueuedMutation> {
        self.queue.pending()
    }

    #[must_use]
    pub fn mutation_state(&self, mutation_id: &Uuid) -> Option<MutationState> {
        self.ledger().state(mutation_id)
    }

    /// Seed the cache with confirmed tasks. Entities with local changes in
    /// flight keep their optimistic value.
    pub fn hydrate(&self, tasks: Vec<Task>) -> Result<usize> {
        self.ensure_open()?;
        let mut cache = self.cache();
        let count = tasks.len();
        for task in tasks {
            absorb_confirmed(&mut cache, task);
        }
        debug!(count, "Hydrated task cache");
        Ok(count)
    }

    /// Reload remote truth.
    ///
    /// Confirmed entries missing remotely are evicted; optimistic entries
    /// and locally deleted tasks are left to their pending mutations.
    pub async fn refresh(&self) -> Result<usize> {
        self.ensure_open()?;
        let remote = self.remote.list().await?;
        let remote_ids: HashSet<TaskId> = remote.iter().map(|t| t.id.clone()).collect();

        let mut cache = self.cache();
        for id in cache.ids() {
            let evict = cache
                .get(&id)
                .is_some_and(|entry| !entry.current.optimistic && !remote_ids.contains(&id));
            if evict {
                cache.remove(&id);
            }
        }
        let count = remote.len();
        for task in remote {
            absorb_confirmed(&mut cache, task);
        }
        info!(count, "Refreshed task cache from remote");
        Ok(count)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a batch of tasks.
    ///
    /// Tasks appear immediately under temporary ids. Online, the returned
    /// tasks carry server ids; offline, they are the optimistic records and
    /// the creates wait in the queue.
    ///
    /// Online, each input is sent as its own create, in order. A remote
    /// failure removes the failed task and every task after it, then
    /// returns the error; tasks confirmed before the failure stay in the
    /// cache and have already published their `Created` events.
    pub async fn create_tasks(&self, batch: Vec<NewTaskInput>) -> Result<Vec<Task>> {
        self.ensure_open()?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        for input in &batch {
            input.validate()?;
        }

        let temp_ids: Vec<TaskId> = batch.iter().map(|_| TaskId::temporary()).collect();
        let mut guards = Vec::with_capacity(temp_ids.len());
        for id in &temp_ids {
            guards.push(self.locks.acquire(id).await);
        }

        let now = Utc::now();
        let (snapshots, optimistic, mutation_ids, route) = {
            let mut cache = self.cache();
            let mut ledger = self.ledger();
            let mut snapshots = Vec::with_capacity(batch.len());
            let mut optimistic = Vec::with_capacity(batch.len());
            let mut mutations = Vec::with_capacity(batch.len());

            for (id, input) in temp_ids.iter().zip(&batch) {
                let mut input = input.clone();
                if let Some(parent) = &input.parent_task_id {
                    input.parent_task_id = Some(cache.resolve(parent));
                }
                let task = Task::from_input(id.clone(), &input, now);
                snapshots.push(cache.snapshot(id));
                cache.insert(id.clone(), CacheEntry::optimistic(task.clone()));
                let mutation = QueuedMutation::create(id.clone(), input);
                ledger.begin(mutation.mutation_id);
                optimistic.push(task);
                mutations.push(mutation);
            }

            let mutation_ids: Vec<Uuid> = mutations.iter().map(|m| m.mutation_id).collect();
            let route = self.queue.route_batch(self.is_online(), mutations);
            if matches!(route, BatchRoute::Deferred) {
                for id in &mutation_ids {
                    ledger.transition(*id, MutationState::Queued);
                }
            }
            (snapshots, optimistic, mutation_ids, route)
        };

        let result = match route {
            BatchRoute::Deferred => {
                debug!(count = optimistic.len(), "Queued task creation");
                Ok(optimistic)
            }
            BatchRoute::Direct(mutations) => {
                self.send_creates(&mutations, snapshots, &mutation_ids).await
            }
        };

        drop(guards);
        for id in &temp_ids {
            self.locks.release_unused(id);
        }
        result
    }

    async fn send_creates(
        &self,
        mutations: &[QueuedMutation],
        snapshots: Vec<EntitySnapshot>,
        mutation_ids: &[Uuid],
    ) -> Result<Vec<Task>> {
        let mut created = Vec::with_capacity(mutations.len());
        for (index, mutation) in mutations.iter().enumerate() {
            let MutationPayload::Create { input } = &mutation.payload else {
                continue;
            };
            match self.remote.create(input).await {
                Ok(server) => {
                    self.reconcile_create(&mutation.entity_ref, server.clone(), mutation.mutation_id);
                    self.transition(mutation.mutation_id, MutationState::Confirmed);
                    created.push(server);
                }
                Err(e) => {
                    let e = TaskstreamError::from(e);
                    if index > 0 {
                        warn!(
                            confirmed = index,
                            rolled_back = mutations.len() - index,
                            "Batch create failed part way"
                        );
                    }
                    let unsent = snapshots.into_iter().skip(index).collect();
                    self.rollback(unsent, &mutation_ids[index..], &e);
                    return Err(e);
                }
            }
        }
        info!(count = created.len(), "Created tasks");
        Ok(created)
    }

    /// Apply a partial update.
    pub async fn update_task(&self, id: &TaskId, updates: TaskPatch) -> Result<Task> {
        self.update_inner(id, updates, None).await
    }

    /// Apply a partial update computed against `base_revision`.
    ///
    /// Fails with [`TaskstreamError::StaleRevision`] if the entity changed
    /// locally since that revision was read.
    pub async fn update_task_at(
        &self,
        id: &TaskId,
        updates: TaskPatch,
        base_revision: u64,
    ) -> Result<Task> {
        self.update_inner(id, updates, Some(base_revision)).await
    }

    /// Mark a task complete now.
    pub async fn complete_task(&self, id: &TaskId) -> Result<Task> {
        self.update_inner(id, TaskPatch::completion(Utc::now()), None)
            .await
    }

    async fn update_inner(
        &self,
        id: &TaskId,
        updates: TaskPatch,
        base_revision: Option<u64>,
    ) -> Result<Task> {
        self.ensure_open()?;
        updates.validate()?;
        let (id, guard) = self.lock_entity(id).await;
        let result = self.update_locked(&id, updates, base_revision).await;
        drop(guard);
        self.locks.release_unused(&id);
        result
    }

    async fn update_locked(
        &self,
        id: &TaskId,
        updates: TaskPatch,
        base_revision: Option<u64>,
    ) -> Result<Task> {
        let id = id.clone();
        let (snapshot, patch, optimistic, mutation_id, route) = {
            let mut cache = self.cache();
            let mut patch = updates;
            if let Some(parent) = patch.parent_task_id.clone().flatten() {
                let resolved = cache.resolve(&parent);
                patch.remap_reference(&parent, &resolved);
            }

            let snapshot = cache.snapshot(&id);
            let Some(entry) = cache.get_mut(&id) else {
                return Err(TaskstreamError::task_not_found(id.to_string()));
            };
            if let Some(expected) = base_revision {
                if entry.current.revision != expected {
                    return Err(TaskstreamError::StaleRevision {
                        id: id.to_string(),
                        expected,
                        actual: entry.current.revision,
                    });
                }
            }
            patch.apply_to(&mut entry.current.task);
            entry.current.task.updated_at = Utc::now();
            entry.current.optimistic = true;
            entry.current.revision += 1;
            let optimistic = entry.current.task.clone();

            let mutation = QueuedMutation::update(id.clone(), patch.clone());
            let mutation_id = mutation.mutation_id;
            let mut ledger = self.ledger();
            ledger.begin(mutation_id);
            let route = self.queue.route(self.is_online(), mutation);
            if matches!(route, Route::Deferred) {
                ledger.transition(mutation_id, MutationState::Queued);
            }
            (snapshot, patch, optimistic, mutation_id, route)
        };

        match route {
            Route::Deferred => {
                debug!(task_id = %id, "Queued task update");
                Ok(optimistic)
            }
            Route::Direct(_) => match self.remote.update(&id, &patch).await {
                Ok(server) => {
                    self.reconcile_update(&id, server.clone(), mutation_id);
                    self.transition(mutation_id, MutationState::Confirmed);
                    Ok(server)
                }
                Err(e) => {
                    let e = TaskstreamError::from(e);
                    self.rollback(vec![snapshot], &[mutation_id], &e);
                    Err(e)
                }
            },
        }
    }

    /// Delete a task. The task disappears from the view immediately.
    pub async fn delete_task(&self, id: &TaskId) -> Result<()> {
        self.ensure_open()?;
        let (id, guard) = self.lock_entity(id).await;
        let result = self.delete_locked(&id).await;
        drop(guard);
        self.locks.release_unused(&id);
        result
    }

    async fn delete_locked(&self, id: &TaskId) -> Result<()> {
        let id = id.clone();
        let (snapshot, mutation_id, route) = {
            let mut cache = self.cache();
            let snapshot = cache.snapshot(&id);
            let Some(entry) = cache.remove(&id) else {
                return Err(TaskstreamError::task_not_found(id.to_string()));
            };
            let last_known = entry.confirmed.unwrap_or(entry.current.task);
            cache.bury(id.clone(), last_known);

            let mutation = QueuedMutation::delete(id.clone());
            let mutation_id = mutation.mutation_id;
            let mut ledger = self.ledger();
            ledger.begin(mutation_id);
            let route = self.queue.route(self.is_online(), mutation);
            if matches!(route, Route::Deferred) {
                ledger.transition(mutation_id, MutationState::Queued);
            }
            (snapshot, mutation_id, route)
        };

        match route {
            Route::Deferred => {
                debug!(task_id = %id, "Queued task deletion");
                Ok(())
            }
            Route::Direct(_) => match self.remote.delete(&id).await {
                Ok(()) | Err(RemoteError::NotFound { .. }) => {
                    self.reconcile_delete(&id);
                    self.transition(mutation_id, MutationState::Confirmed);
                    Ok(())
                }
                Err(e) => {
                    let e = TaskstreamError::from(e);
                    self.rollback(vec![snapshot], &[mutation_id], &e);
                    Err(e)
                }
            },
        }
    }

    /// Replay the offline queue.
    ///
    /// A transient failure pauses the drain and marks the store offline
    /// until connectivity is reported again.
    pub async fn drain(&self) -> DrainReport {
        if self.is_closed() || !self.is_online() {
            return DrainReport::default();
        }
        let report = self.queue.drain(self).await;
        if report.paused_on.is_some() {
            self.set_online(false);
        }
        report
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Lock the entity `id` currently refers to.
    ///
    /// A create confirmed while waiting moves the entity to its server id,
    /// so the id is resolved again once the lock is held.
    async fn lock_entity(&self, id: &TaskId) -> (TaskId, EntityGuard) {
        loop {
            let resolved = self.resolve_id(id);
            let guard = self.locks.acquire(&resolved).await;
            if self.resolve_id(id) == resolved {
                return (resolved, guard);
            }
            drop(guard);
            self.locks.release_unused(&resolved);
        }
    }

    fn rollback(&self, snapshots: Vec<EntitySnapshot>, mutation_ids: &[Uuid], error: &TaskstreamError) {
        let Some(mut cache) = self.live_cache() else {
            debug!("Session closed, skipping rollback: {}", error);
            return;
        };
        let mut ledger = self.ledger();
        for snapshot in snapshots {
            warn!(task_id = %snapshot.id, "Rolling back optimistic change: {}", error);
            cache.restore(snapshot);
        }
        for id in mutation_ids {
            ledger.transition(*id, MutationState::RolledBack);
        }
    }

    /// Move a confirmed create from its temporary id to the server id.
    fn reconcile_create(&self, temp: &TaskId, server: Task, mutation_id: Uuid) {
        let real = server.id.clone();
        let publish = {
            let mut cache = self.cache();
            // The persisted queue outlives the session.
            self.queue.remap(temp, &real);
            if self.is_closed() {
                debug!(task_id = %real, "Session closed, discarding create confirmation");
                return;
            }
            cache.alias(temp, &real);
            let later_pending = self.queue.has_pending_for(&real, Some(mutation_id));

            match cache.remove(temp) {
                Some(entry) => {
                    let revision = entry.current.revision;
                    let entry = if later_pending {
                        let mut current = entry.current;
                        current.task.id = real.clone();
                        CacheEntry {
                            current,
                            confirmed: Some(server.clone()),
                        }
                    } else {
                        CacheEntry::confirmed(server.clone(), revision)
                    };
                    cache.insert(real.clone(), entry);
                    true
                }
                None if cache.is_buried(&real) => {
                    debug!(task_id = %real, "Discarding create confirmation for deleted task");
                    cache.bury(real.clone(), server.clone());
                    false
                }
                // Restored from a previous session's queue.
                None => {
                    cache.insert(real.clone(), CacheEntry::confirmed(server.clone(), 1));
                    true
                }
            }
        };

        debug!(temp_id = %temp, task_id = %real, "Confirmed task creation");
        if publish {
            self.events.publish(TaskEvent::created(server));
        }
    }

    fn reconcile_update(&self, id: &TaskId, server: Task, mutation_id: Uuid) {
        let publish = {
            let Some(mut cache) = self.live_cache() else {
                debug!(task_id = %id, "Session closed, discarding update confirmation");
                return;
            };
            let later_pending = self.queue.has_pending_for(id, Some(mutation_id));
            if cache.is_buried(id) {
                debug!(task_id = %id, "Discarding update confirmation for deleted task");
                cache.bury(id.clone(), server.clone());
                false
            } else {
                match cache.get_mut(id) {
                    Some(entry) => {
                        entry.confirmed = Some(server.clone());
                        if !later_pending {
                            entry.current.task = server.clone();
                            entry.current.optimistic = false;
                        }
                    }
                    None => cache.insert(id.clone(), CacheEntry::confirmed(server.clone(), 1)),
                }
                true
            }
        };

        if publish {
            self.events.publish(TaskEvent::updated(server));
        }
    }

    fn reconcile_delete(&self, id: &TaskId) {
        let Some(mut cache) = self.live_cache() else {
            debug!(task_id = %id, "Session closed, discarding delete confirmation");
            return;
        };
        let buried = cache.exhume(id);
        drop(cache);
        match buried {
            Some(task) => self.events.publish(TaskEvent::deleted(task)),
            None => debug!(task_id = %id, "Delete confirmed for task no longer tracked"),
        }
    }
}

/// Fold a server-confirmed task into the cache without disturbing local
/// changes still in flight.
fn absorb_confirmed(cache: &mut TaskCache, task: Task) {
    if cache.is_buried(&task.id) {
        return;
    }
    match cache.get_mut(&task.id) {
        Some(entry) if entry.current.optimistic => entry.confirmed = Some(task),
        Some(entry) => {
            if entry.current.task != task {
                entry.current.task = task.clone();
                entry.current.revision += 1;
            }
            entry.confirmed = Some(task);
        }
        None => cache.insert(task.id.clone(), CacheEntry::confirmed(task, 1)),
    }
}

#[async_trait]
impl ReplayHandler for OptimisticTaskStore {
    async fn replay(&self, mutation: &QueuedMutation) -> Result<()> {
        let id = &mutation.entity_ref;
        match &mutation.payload {
            MutationPayload::Create { input } => {
                if input.parent_task_id.as_ref().is_some_and(TaskId::is_temporary) {
                    return Err(TaskstreamError::replay_terminal(
                        mutation.mutation_id,
                        "parent task was never confirmed",
                    ));
                }
                let server = self.remote.create(input).await?;
                self.reconcile_create(id, server, mutation.mutation_id);
            }
            MutationPayload::Update { patch } => {
                if id.is_temporary() {
                    return Err(TaskstreamError::replay_terminal(
                        mutation.mutation_id,
                        format!("create for {id} was never confirmed"),
                    ));
                }
                let server = self.remote.update(id, patch).await?;
                self.reconcile_update(id, server, mutation.mutation_id);
            }
            MutationPayload::Delete => {
                if id.is_temporary() {
                    return Err(TaskstreamError::replay_terminal(
                        mutation.mutation_id,
                        format!("create for {id} was never confirmed"),
                    ));
                }
                match self.remote.delete(id).await {
                    Ok(()) | Err(RemoteError::NotFound { .. }) => {}
                    Err(e) => return Err(e.into()),
                }
                self.reconcile_delete(id);
            }
        }
        self.transition(mutation.mutation_id, MutationState::Confirmed);
        Ok(())
    }

    fn dropped(&self, mutation: &QueuedMutation, error: &TaskstreamError) {
        let id = &mutation.entity_ref;
        {
            let Some(mut cache) = self.live_cache() else {
                debug!(mutation_id = %mutation.mutation_id, "Session closed, nothing to restore");
                return;
            };
            let later_pending = self.queue.has_pending_for(id, Some(mutation.mutation_id));
            match mutation.kind() {
                MutationKind::Create => {
                    cache.remove(id);
                    cache.exhume(id);
                }
                MutationKind::Update if !later_pending => {
                    let baseline = match error {
                        TaskstreamError::RemoteNotFound { .. } => None,
                        _ => cache.get(id).and_then(|entry| entry.confirmed.clone()),
                    };
                    match (baseline, cache.get_mut(id)) {
                        (Some(task), Some(entry)) => {
                            entry.current.task = task;
                            entry.current.optimistic = false;
                            entry.current.revision += 1;
                        }
                        (None, Some(_)) => {
                            cache.remove(id);
                        }
                        (_, None) => {}
                    }
                }
                MutationKind::Update => {}
                MutationKind::Delete => {
                    let buried = cache.exhume(id);
                    let gone = id.is_temporary()
                        || matches!(error, TaskstreamError::RemoteNotFound { .. });
                    if let (Some(task), false) = (buried, gone) {
                        cache.insert(id.clone(), CacheEntry::confirmed(task, 1));
                    }
                }
            }
        }
        warn!(
            mutation_id = %mutation.mutation_id,
            kind = %mutation.kind(),
            task_id = %id,
            "Restored cache after dropping mutation: {}",
            error
        );
        self.transition(mutation.mutation_id, MutationState::DroppedWithError);
    }

    fn is_active(&self) -> bool {
        !self.is_closed()
    }
}
