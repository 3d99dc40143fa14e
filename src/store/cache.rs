//! In-memory task cache with revisions, confirmed baselines and temp-id
//! aliases.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Task, TaskId};

/// A cache entry as seen by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTask {
    pub task: Task,
    /// Not yet confirmed by the remote store.
    pub optimistic: bool,
    /// Bumped on every local change to the entity.
    pub revision: u64,
}

/// Internal entry: what readers see plus the last server-confirmed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CacheEntry {
    pub current: CachedTask,
    pub confirmed: Option<Task>,
}

impl CacheEntry {
    pub fn optimistic(task: Task) -> Self {
        Self {
            current: CachedTask {
                task,
                optimistic: true,
                revision: 1,
            },
            confirmed: None,
        }
    }

    pub fn confirmed(task: Task, revision: u64) -> Self {
        Self {
            current: CachedTask {
                task: task.clone(),
                optimistic: false,
                revision,
            },
            confirmed: Some(task),
        }
    }
}

/// Previous state of one entity, captured before an optimistic change.
#[derive(Debug, Clone)]
pub(crate) struct EntitySnapshot {
    pub id: TaskId,
    pub entry: Option<CacheEntry>,
}

/// The user's task cache.
#[derive(Debug, Default)]
pub(crate) struct TaskCache {
    entries: HashMap<TaskId, CacheEntry>,
    /// Temporary id -> confirmed id.
    aliases: HashMap<TaskId, TaskId>,
    /// Last known value of entities deleted locally but not yet confirmed.
    tombstones: HashMap<TaskId, Task>,
}

impl TaskCache {
    /// Follow temp-id aliases to the id currently used in the cache.
    pub fn resolve(&self, id: &TaskId) -> TaskId {
        let mut current = id;
        // Aliases form chains of length one; the bound guards against cycles.
        for _ in 0..4 {
            match self.aliases.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.clone()
    }

    pub fn get(&self, id: &TaskId) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut CacheEntry> {
        self.entries.get_mut(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, id: TaskId, entry: CacheEntry) {
        self.entries.insert(id, entry);
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<CacheEntry> {
        self.entries.remove(id)
    }

    pub fn snapshot(&self, id: &TaskId) -> EntitySnapshot {
        EntitySnapshot {
            id: id.clone(),
            entry: self.entries.get(id).cloned(),
        }
    }

    /// Put an entity back exactly as it was.
    pub fn restore(&mut self, snapshot: EntitySnapshot) {
        self.tombstones.remove(&snapshot.id);
        match snapshot.entry {
            Some(entry) => {
                self.entries.insert(snapshot.id, entry);
            }
            None => {
                self.entries.remove(&snapshot.id);
            }
        }
    }

    pub fn bury(&mut self, id: TaskId, task: Task) {
        self.tombstones.insert(id, task);
    }

    pub fn exhume(&mut self, id: &TaskId) -> Option<Task> {
        self.tombstones.remove(id)
    }

    pub fn is_buried(&self, id: &TaskId) -> bool {
        self.tombstones.contains_key(id)
    }

    /// Record that `temp` now lives under `real` and rewrite references.
    pub fn alias(&mut self, temp: &TaskId, real: &TaskId) {
        self.aliases.insert(temp.clone(), real.clone());
        for entry in self.entries.values_mut() {
            if entry.current.task.parent_task_id.as_ref() == Some(temp) {
                entry.current.task.parent_task_id = Some(real.clone());
            }
            if let Some(confirmed) = &mut entry.confirmed {
                if confirmed.parent_task_id.as_ref() == Some(temp) {
                    confirmed.parent_task_id = Some(real.clone());
                }
            }
        }
        if let Some(task) = self.tombstones.remove(temp) {
            self.tombstones.insert(real.clone(), task);
        }
    }

    /// Reader view sorted by creation time, then id.
    pub fn tasks(&self) -> Vec<CachedTask> {
        let mut tasks: Vec<CachedTask> = self.entries.values().map(|e| e.current.clone()).collect();
        tasks.sort_by(|a, b| {
            a.task
                .created_at
                .cmp(&b.task.created_at)
                .then_with(|| a.task.id.cmp(&b.task.id))
        });
        tasks
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.aliases.clear();
        self.tombstones.clear();
    }
}
