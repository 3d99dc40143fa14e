//! Queued mutation records and the mutation lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::warn;
use uuid::Uuid;

use super::CONFIRMED_HISTORY;
use crate::model::{NewTaskInput, TaskId, TaskPatch};

// ============================================================================
// Mutation Kind and Payload
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// What a mutation sends to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationPayload {
    Create { input: NewTaskInput },
    Update { patch: TaskPatch },
    Delete,
}

impl MutationPayload {
    #[must_use]
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Update { .. } => MutationKind::Update,
            Self::Delete => MutationKind::Delete,
        }
    }
}

// ============================================================================
// Queued Mutation
// ============================================================================

/// A mutation waiting for the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMutation {
    pub mutation_id: Uuid,
    /// Temporary or server id of the target task.
    pub entity_ref: TaskId,
    pub payload: MutationPayload,
    pub enqueued_at: DateTime<Utc>,
    pub attempts: u32,
}

impl QueuedMutation {
    pub fn new(entity_ref: TaskId, payload: MutationPayload) -> Self {
        Self {
            mutation_id: Uuid::new_v4(),
            entity_ref,
            payload,
            enqueued_at: Utc::now(),
            attempts: 0,
        }
    }

    pub fn create(temp_id: TaskId, input: NewTaskInput) -> Self {
        Self::new(temp_id, MutationPayload::Create { input })
    }

    pub fn update(id: TaskId, patch: TaskPatch) -> Self {
        Self::new(id, MutationPayload::Update { patch })
    }

    pub fn delete(id: TaskId) -> Self {
        Self::new(id, MutationPayload::Delete)
    }

    #[must_use]
    pub fn kind(&self) -> MutationKind {
        self.payload.kind()
    }

    /// Rewrite every reference to `from` into `to`.
    ///
    /// Returns true when anything changed.
    pub fn remap(&mut self, from: &TaskId, to: &TaskId) -> bool {
        let mut changed = false;
        if &self.entity_ref == from {
            self.entity_ref = to.clone();
            changed = true;
        }
        match &mut self.payload {
            MutationPayload::Create { input } => {
                if input.parent_task_id.as_ref() == Some(from) {
                    input.parent_task_id = Some(to.clone());
                    changed = true;
                }
            }
            MutationPayload::Update { patch } => {
                let before = patch.parent_task_id.clone();
                patch.remap_reference(from, to);
                changed |= before != patch.parent_task_id;
            }
            MutationPayload::Delete => {}
        }
        changed
    }
}

// ============================================================================
// Mutation State
// ============================================================================

/// Lifecycle of a single store mutation.
///
/// # State Transitions
///
/// - `PendingOptimistic` -> `Confirmed`: online, remote accepted
/// - `PendingOptimistic` -> `RolledBack`: online, remote failed
/// - `PendingOptimistic` -> `Queued`: offline
/// - `Queued` -> `Confirmed`: drained successfully
/// - `Queued` -> `DroppedWithError`: drain hit a terminal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationState {
    PendingOptimistic,
    Queued,
    Confirmed,
    RolledBack,
    DroppedWithError,
}

impl MutationState {
    #[must_use]
    pub fn can_transition_to(&self, target: MutationState) -> bool {
        use MutationState::*;
        matches!(
            (self, target),
            (PendingOptimistic, Confirmed)
                | (PendingOptimistic, RolledBack)
                | (PendingOptimistic, Queued)
                | (Queued, Confirmed)
                | (Queued, DroppedWithError)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MutationState::Confirmed | MutationState::RolledBack | MutationState::DroppedWithError
        )
    }
}

impl fmt::Display for MutationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingOptimistic => write!(f, "Pending (optimistic)"),
            Self::Queued => write!(f, "Queued"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::RolledBack => write!(f, "Rolled back"),
            Self::DroppedWithError => write!(f, "Dropped with error"),
        }
    }
}

/// Per-mutation lifecycle ledger.
///
/// Only the most recent [`CONFIRMED_HISTORY`] terminal states are kept;
/// mutations still in flight are never evicted.
#[derive(Debug, Default)]
pub struct MutationLedger {
    states: HashMap<Uuid, MutationState>,
    settled: VecDeque<Uuid>,
}

impl MutationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new mutation in `PendingOptimistic`.
    pub fn begin(&mut self, id: Uuid) {
        self.states.insert(id, MutationState::PendingOptimistic);
    }

    /// Move a mutation to `target`.
    ///
    /// Invalid transitions are logged and ignored. Returns whether the
    /// transition was applied.
    pub fn transition(&mut self, id: Uuid, target: MutationState) -> bool {
        match self.states.get(&id).copied() {
            Some(current) if current.can_transition_to(target) => {
                self.states.insert(id, target);
                if target.is_terminal() {
                    self.settle(id);
                }
                true
            }
            Some(current) => {
                warn!(mutation_id = %id, from = %current, to = %target, "Invalid mutation transition");
                false
            }
            None => {
                // Queue entries reloaded from disk have no in-memory history.
                if target == MutationState::Queued {
                    self.states.insert(id, target);
                    true
                } else if matches!(
                    target,
                    MutationState::Confirmed | MutationState::DroppedWithError
                ) {
                    self.states.insert(id, MutationState::Queued);
                    self.transition(id, target)
                } else {
                    warn!(mutation_id = %id, to = %target, "Transition for unknown mutation");
                    false
                }
            }
        }
    }

    fn settle(&mut self, id: Uuid) {
        self.settled.push_back(id);
        while self.settled.len() > CONFIRMED_HISTORY {
            if let Some(old) = self.settled.pop_front() {
                self.states.remove(&old);
            }
        }
    }

    #[must_use]
    pub fn state(&self, id: &Uuid) -> Option<MutationState> {
        self.states.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.settled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        use MutationState::*;
        assert!(PendingOptimistic.can_transition_to(Confirmed));
        assert!(PendingOptimistic.can_transition_to(Queued));
        assert!(Queued.can_transition_to(DroppedWithError));
        assert!(!Queued.can_transition_to(RolledBack));
        assert!(!Confirmed.can_transition_to(Queued));
        assert!(RolledBack.is_terminal());
        assert!(!Queued.is_terminal());
    }

    #[test]
    fn test_ledger_rejects_invalid_transition() {
        let mut ledger = MutationLedger::new();
        let id = Uuid::new_v4();
        ledger.begin(id);
        assert!(ledger.transition(id, MutationState::Confirmed));
        assert!(!ledger.transition(id, MutationState::RolledBack));
        assert_eq!(ledger.state(&id), Some(MutationState::Confirmed));
    }

    #[test]
    fn test_ledger_accepts_reloaded_queue_entries() {
        let mut ledger = MutationLedger::new();
        let id = Uuid::new_v4();
        assert!(ledger.transition(id, MutationState::Confirmed));
        assert_eq!(ledger.state(&id), Some(MutationState::Confirmed));
    }

    #[test]
    fn test_ledger_forgets_oldest_settled_states() {
        let mut ledger = MutationLedger::new();
        let in_flight = Uuid::new_v4();
        ledger.begin(in_flight);

        let settled: Vec<Uuid> = (0..CONFIRMED_HISTORY + 10).map(|_| Uuid::new_v4()).collect();
        for id in &settled {
            ledger.begin(*id);
            ledger.transition(*id, MutationState::Confirmed);
        }

        assert_eq!(ledger.len(), CONFIRMED_HISTORY + 1);
        assert_eq!(ledger.state(&settled[0]), None);
        assert_eq!(
            ledger.state(&settled[settled.len() - 1]),
            Some(MutationState::Confirmed)
        );
        assert_eq!(
            ledger.state(&in_flight),
            Some(MutationState::PendingOptimistic)
        );
    }

    #[test]
    fn test_remap_rewrites_entity_and_parent() {
        let temp = TaskId::temporary();
        let real = TaskId::new("task-7");

        let mut update = QueuedMutation::update(temp.clone(), TaskPatch::title("x"));
        assert!(update.remap(&temp, &real));
        assert_eq!(update.entity_ref, real);

        let child_input = NewTaskInput {
            title: "child".into(),
            parent_task_id: Some(temp.clone()),
            ..NewTaskInput::default()
        };
        let mut child = QueuedMutation::create(TaskId::temporary(), child_input);
        assert!(child.remap(&temp, &real));
        match &child.payload {
            MutationPayload::Create { input } => {
                assert_eq!(input.parent_task_id, Some(real.clone()))
            }
            other => panic!("unexpected payload: {other:?}"),
        }

        let mut unrelated = QueuedMutation::delete(TaskId::new("task-1"));
        assert!(!unrelated.remap(&temp, &real));
    }

    #[test]
    fn test_payload_serde_tag() {
        let mutation = QueuedMutation::delete(TaskId::new("task-1"));
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json["payload"]["kind"], "delete");
        assert_eq!(mutation.kind(), MutationKind::Delete);
    }
}
