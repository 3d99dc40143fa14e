//! Confirmed task events.
//!
//! Events are only published once the remote store has confirmed a
//! mutation. Optimistic application never publishes, so subscribers such as
//! streak or reward logic cannot double-count a change that is later rolled
//! back.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    Created,
    Updated,
    Deleted,
}

/// A confirmed state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub kind: TaskEventKind,
    pub task: Task,
}

impl TaskEvent {
    #[must_use]
    pub fn created(task: Task) -> Self {
        Self {
            kind: TaskEventKind::Created,
            task,
        }
    }

    #[must_use]
    pub fn updated(task: Task) -> Self {
        Self {
            kind: TaskEventKind::Updated,
            task,
        }
    }

    #[must_use]
    pub fn deleted(task: Task) -> Self {
        Self {
            kind: TaskEventKind::Deleted,
            task,
        }
    }
}

/// Broadcast fan-out of confirmed events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TaskEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: TaskEvent) {
        debug!(kind = ?event.kind, task_id = %event.task.id, "Publishing confirmed event");
        let _ = self.sender.send(event);
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTaskInput, TaskId};
    use chrono::Utc;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let task = Task::from_input(TaskId::new("task-1"), &NewTaskInput::titled("x"), Utc::now());

        bus.publish(TaskEvent::created(task.clone()));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, TaskEventKind::Created);
        assert_eq!(event.task, task);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(8);
        let task = Task::from_input(TaskId::new("task-1"), &NewTaskInput::titled("x"), Utc::now());
        bus.publish(TaskEvent::deleted(task));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
