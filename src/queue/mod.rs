//! Offline mutation queue.
//!
//! Mutations that cannot reach the network are appended here and replayed
//! strictly one at a time, in enqueue order, across all entities. A later
//! mutation is never sent before an earlier one has been acknowledged or
//! terminally dropped.
//!
//! # Architecture
//!
//! ```text
//! OptimisticTaskStore ──route──> OfflineQueue ──persist──> <queue_dir>/<user>.json
//!          ▲                           │
//!          │                         drain
//!          │                           ▼
//!          └──────────────── ReplayHandler::replay / dropped
//! ```
//!
//! The queue owns ordering, idempotence and pausing. Sending a mutation and
//! reconciling the cache is delegated back to the store through
//! [`ReplayHandler`].

pub mod mutation;
pub mod persistence;

pub use mutation::{
    MutationKind, MutationLedger, MutationPayload, MutationState, QueuedMutation,
};
pub use persistence::{QueueFile, QueuePersistence, QUEUE_FILE_VERSION};

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Result, TaskstreamError};
use crate::model::TaskId;

/// Number of confirmed mutation ids remembered for duplicate suppression.
pub const CONFIRMED_HISTORY: usize = 1024;

/// Callback surface the queue uses while draining.
#[async_trait]
pub trait ReplayHandler: Send + Sync {
    /// Send one mutation and reconcile the cache on success.
    ///
    /// # Errors
    ///
    /// Transient errors pause the drain; any other error drops the mutation.
    async fn replay(&self, mutation: &QueuedMutation) -> Result<()>;

    /// Called once a mutation has been dropped for good.
    fn dropped(&self, mutation: &QueuedMutation, error: &TaskstreamError);

    /// Checked before each mutation; a drain stops once this turns false.
    fn is_active(&self) -> bool {
        true
    }
}

/// Where the store should send a new mutation.
#[derive(Debug)]
pub enum Route {
    /// Accepted into the queue.
    Deferred,
    /// Path is clear; send it directly.
    Direct(QueuedMutation),
}

/// Where the store should send a batch of mutations.
#[derive(Debug)]
pub enum BatchRoute {
    Deferred,
    Direct(Vec<QueuedMutation>),
}

/// A mutation dropped during a drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedMutation {
    pub mutation_id: Uuid,
    pub kind: MutationKind,
    pub entity_ref: TaskId,
    pub error: String,
}

/// Outcome of one [`OfflineQueue::drain`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub confirmed: Vec<Uuid>,
    pub dropped: Vec<DroppedMutation>,
    /// Already-confirmed duplicates removed without a network call.
    pub skipped: Vec<Uuid>,
    /// Mutation left at the front after a transient failure.
    pub paused_on: Option<Uuid>,
    /// Another drain was running; nothing was done.
    pub already_draining: bool,
}

impl DrainReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.paused_on.is_none() && !self.already_draining
    }
}

#[derive(Debug, Default)]
struct QueueState {
    mutations: VecDeque<QueuedMutation>,
    confirmed: VecDeque<Uuid>,
    confirmed_set: HashSet<Uuid>,
    draining: bool,
}

impl QueueState {
    fn remember_confirmed(&mut self, id: Uuid) {
        if self.confirmed_set.insert(id) {
            self.confirmed.push_back(id);
            while self.confirmed.len() > CONFIRMED_HISTORY {
                if let Some(old) = self.confirmed.pop_front() {
                    self.confirmed_set.remove(&old);
                }
            }
        }
    }
}

/// Durable FIFO of mutations pending network availability.
#[derive(Debug)]
pub struct OfflineQueue {
    user_id: String,
    max_attempts: u32,
    persistence: Option<QueuePersistence>,
    state: Mutex<QueueState>,
}

/// Clears the draining flag even if a drain is cancelled mid-flight.
struct DrainGuard<'a>(&'a OfflineQueue);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().draining = false;
    }
}

impl OfflineQueue {
    /// Queue kept only in memory.
    #[must_use]
    pub fn in_memory(user_id: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            user_id: user_id.into(),
            max_attempts: max_attempts.max(1),
            persistence: None,
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Queue backed by a file, restoring whatever was persisted.
    pub fn open(persistence: QueuePersistence, user_id: impl Into<String>, max_attempts: u32) -> Result<Self> {
        let mut state = QueueState::default();
        if let Some(file) = persistence.load()? {
            info!(
                pending = file.mutations.len(),
                "Restored offline queue from {}",
                persistence.queue_file_path().display()
            );
            state.mutations = file.mutations;
            for id in file.confirmed {
                state.remember_confirmed(id);
            }
        }

        Ok(Self {
            user_id: user_id.into(),
            max_attempts: max_attempts.max(1),
            persistence: Some(persistence),
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, state: &QueueState) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let file = QueueFile {
            version: QUEUE_FILE_VERSION,
            user_id: self.user_id.clone(),
            mutations: state.mutations.clone(),
            confirmed: state.confirmed.clone(),
        };
        if let Err(e) = persistence.save(&file) {
            warn!("Failed to persist offline queue: {}", e);
        }
    }

    /// Append a mutation.
    ///
    /// Returns false if the mutation was already confirmed or is already
    /// queued; replaying it again would be a no-op.
    pub fn enqueue(&self, mutation: QueuedMutation) -> bool {
        let mut state = self.lock();
        if state.confirmed_set.contains(&mutation.mutation_id)
            || state
                .mutations
                .iter()
                .any(|m| m.mutation_id == mutation.mutation_id)
        {
            debug!(mutation_id = %mutation.mutation_id, "Ignoring duplicate mutation");
            return false;
        }
        debug!(
            mutation_id = %mutation.mutation_id,
            kind = %mutation.kind(),
            task_id = %mutation.entity_ref,
            "Enqueued offline mutation"
        );
        state.mutations.push_back(mutation);
        self.persist(&state);
        true
    }

    /// Queue `mutation` if it must wait behind earlier ones, otherwise hand
    /// it back for direct sending.
    ///
    /// A mutation waits when the store is offline, the queue is non-empty,
    /// or a drain is running.
    pub fn route(&self, online: bool, mutation: QueuedMutation) -> Route {
        let mut state = self.lock();
        if path_is_clear(&state, online) {
            return Route::Direct(mutation);
        }
        debug!(
            mutation_id = %mutation.mutation_id,
            kind = %mutation.kind(),
            task_id = %mutation.entity_ref,
            online,
            "Deferred mutation to offline queue"
        );
        state.mutations.push_back(mutation);
        self.persist(&state);
        Route::Deferred
    }

    /// Route a batch as a unit: either every mutation is sent directly or
    /// every mutation is queued, in order.
    pub fn route_batch(&self, online: bool, mutations: Vec<QueuedMutation>) -> BatchRoute {
        let mut state = self.lock();
        if path_is_clear(&state, online) {
            return BatchRoute::Direct(mutations);
        }
        debug!(count = mutations.len(), online, "Deferred batch to offline queue");
        state.mutations.extend(mutations);
        self.persist(&state);
        BatchRoute::Deferred
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().mutations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().mutations.is_empty()
    }

    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.lock().draining
    }

    /// Pending mutations in replay order.
    #[must_use]
    pub fn pending(&self) -> Vec<QueuedMutation> {
        self.lock().mutations.iter().cloned().collect()
    }

    /// Whether any pending mutation targets `id`, optionally skipping one.
    #[must_use]
    pub fn has_pending_for(&self, id: &TaskId, except: Option<Uuid>) -> bool {
        self.lock()
            .mutations
            .iter()
            .any(|m| &m.entity_ref == id && Some(m.mutation_id) != except)
    }

    #[must_use]
    pub fn is_confirmed(&self, mutation_id: &Uuid) -> bool {
        self.lock().confirmed_set.contains(mutation_id)
    }

    /// Rewrite references to a temporary id after its create is confirmed.
    pub fn remap(&self, from: &TaskId, to: &TaskId) -> usize {
        let mut state = self.lock();
        let changed = state
            .mutations
            .iter_mut()
            .filter_map(|m| m.remap(from, to).then_some(()))
            .count();
        if changed > 0 {
            debug!(from = %from, to = %to, changed, "Remapped queued references");
            self.persist(&state);
        }
        changed
    }

    /// Write the current contents to disk.
    pub fn flush(&self) -> Result<()> {
        let state = self.lock();
        if let Some(persistence) = &self.persistence {
            let file = QueueFile {
                version: QUEUE_FILE_VERSION,
                user_id: self.user_id.clone(),
                mutations: state.mutations.clone(),
                confirmed: state.confirmed.clone(),
            };
            persistence.save(&file)?;
        }
        Ok(())
    }

    /// Replay queued mutations in order until the queue is empty or a
    /// transient failure pauses it.
    ///
    /// Calling this while another drain is running, or on an empty queue,
    /// does nothing.
    pub async fn drain(&self, handler: &dyn ReplayHandler) -> DrainReport {
        let mut report = DrainReport::default();
        {
            let mut state = self.lock();
            if state.draining {
                report.already_draining = true;
                return report;
            }
            if state.mutations.is_empty() {
                return report;
            }
            state.draining = true;
        }
        let _guard = DrainGuard(self);

        loop {
            if !handler.is_active() {
                debug!("Replay handler inactive, stopping drain");
                break;
            }
            let next = {
                let mut state = self.lock();
                let duplicate = match state.mutations.front() {
                    None => {
                        state.draining = false;
                        break;
                    }
                    Some(front) => state.confirmed_set.contains(&front.mutation_id),
                };
                if duplicate {
                    if let Some(skipped) = state.mutations.pop_front() {
                        debug!(mutation_id = %skipped.mutation_id, "Skipping already-confirmed mutation");
                        report.skipped.push(skipped.mutation_id);
                    }
                    self.persist(&state);
                    continue;
                }
                match state.mutations.front_mut() {
                    Some(front) => {
                        front.attempts += 1;
                        let next = front.clone();
                        self.persist(&state);
                        next
                    }
                    None => continue,
                }
            };

            debug!(
                mutation_id = %next.mutation_id,
                kind = %next.kind(),
                task_id = %next.entity_ref,
                attempt = next.attempts,
                "Replaying queued mutation"
            );

            match handler.replay(&next).await {
                Ok(()) => {
                    let mut state = self.lock();
                    pop_if_front(&mut state, next.mutation_id);
                    state.remember_confirmed(next.mutation_id);
                    self.persist(&state);
                    report.confirmed.push(next.mutation_id);
                }
                Err(e) if e.is_transient() && next.attempts < self.max_attempts => {
                    warn!(
                        mutation_id = %next.mutation_id,
                        attempt = next.attempts,
                        "Transient replay failure, pausing queue: {}",
                        e
                    );
                    report.paused_on = Some(next.mutation_id);
                    self.lock().draining = false;
                    break;
                }
                Err(e) => {
                    let e = if e.is_transient() {
                        TaskstreamError::replay_terminal(
                            next.mutation_id,
                            format!("gave up after {} attempts: {e}", next.attempts),
                        )
                    } else {
                        e
                    };
                    error!(
                        mutation_id = %next.mutation_id,
                        kind = %next.kind(),
                        task_id = %next.entity_ref,
                        "Dropping queued mutation: {}",
                        e
                    );
                    {
                        let mut state = self.lock();
                        pop_if_front(&mut state, next.mutation_id);
                        self.persist(&state);
                    }
                    handler.dropped(&next, &e);
                    report.dropped.push(DroppedMutation {
                        mutation_id: next.mutation_id,
                        kind: next.kind(),
                        entity_ref: next.entity_ref.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            confirmed = report.confirmed.len(),
            dropped = report.dropped.len(),
            skipped = report.skipped.len(),
            paused = report.paused_on.is_some(),
            "Offline queue drain finished"
        );
        report
    }
}

fn path_is_clear(state: &QueueState, online: bool) -> bool {
    online && !state.draining && state.mutations.is_empty()
}

fn pop_if_front(state: &mut QueueState, mutation_id: Uuid) {
    if state
        .mutations
        .front()
        .is_some_and(|m| m.mutation_id == mutation_id)
    {
        state.mutations.pop_front();
    } else {
        state.mutations.retain(|m| m.mutation_id != mutation_id);
    }
}
