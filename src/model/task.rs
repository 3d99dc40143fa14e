//! Canonical task entity and the payloads that create or modify it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::classification::{Agenda, Priority, TaskType};
use crate::error::{Result, TaskstreamError};

/// Prefix of client-generated temporary ids.
pub const TEMP_ID_PREFIX: &str = "temp-";

// ============================================================================
// Task Id
// ============================================================================

/// Identifier of a task, either server-assigned or client-generated.
///
/// Temporary ids are minted during the optimistic phase of a create and are
/// replaced by the server id once the create is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh temporary id.
    #[must_use]
    pub fn temporary() -> Self {
        Self(format!("{TEMP_ID_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Task
// ============================================================================

/// Canonical persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub effort: Option<TaskType>,
    #[serde(default)]
    pub scheduled_bucket: Option<Agenda>,
    #[serde(default)]
    pub is_focus: bool,
    #[serde(default)]
    pub focus_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub parent_task_id: Option<TaskId>,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Materialize a task from a creation payload.
    #[must_use]
    pub fn from_input(id: TaskId, input: &NewTaskInput, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title.clone(),
            category: input.category.clone(),
            priority: input.priority,
            effort: input.effort,
            scheduled_bucket: input.scheduled_bucket,
            is_focus: input.is_focus,
            focus_date: input.focus_date,
            completed: false,
            completed_at: None,
            keywords: input.keywords.clone(),
            parent_task_id: input.parent_task_id.clone(),
            plan_id: input.plan_id.clone(),
            project_id: input.project_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// New Task Input
// ============================================================================

/// Payload for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTaskInput {
    pub title: String,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub effort: Option<TaskType>,
    pub scheduled_bucket: Option<Agenda>,
    pub is_focus: bool,
    pub focus_date: Option<NaiveDate>,
    pub keywords: Vec<String>,
    pub parent_task_id: Option<TaskId>,
    pub plan_id: Option<String>,
    pub project_id: Option<String>,
}

impl NewTaskInput {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Reject payloads the remote store would never accept.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TaskstreamError::validation("title", "must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Task Patch
// ============================================================================

/// Partial update of a task.
///
/// Nullable fields use `Option<Option<T>>`: `None` leaves the field alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub category: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub priority: Option<Option<Priority>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub effort: Option<Option<TaskType>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub scheduled_bucket: Option<Option<Agenda>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_focus: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub focus_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub parent_task_id: Option<Option<TaskId>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub plan_id: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub project_id: Option<Option<String>>,
}

/// Keep an explicit `null` as `Some(None)` instead of collapsing it to `None`.
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Patch marking a task complete at `at`.
    #[must_use]
    pub fn completion(at: DateTime<Utc>) -> Self {
        Self {
            completed: Some(true),
            completed_at: Some(Some(at)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(TaskstreamError::validation("updates", "patch is empty"));
        }
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(TaskstreamError::validation("title", "must not be empty"));
        }
        Ok(())
    }

    /// Merge this patch into `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(category) = &self.category {
            task.category = category.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(effort) = self.effort {
            task.effort = effort;
        }
        if let Some(bucket) = self.scheduled_bucket {
            task.scheduled_bucket = bucket;
        }
        if let Some(is_focus) = self.is_focus {
            task.is_focus = is_focus;
        }
        if let Some(focus_date) = self.focus_date {
            task.focus_date = focus_date;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(keywords) = &self.keywords {
            task.keywords = keywords.clone();
        }
        if let Some(parent) = &self.parent_task_id {
            task.parent_task_id = parent.clone();
        }
        if let Some(plan_id) = &self.plan_id {
            task.plan_id = plan_id.clone();
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone();
        }
    }

    /// Rewrite a parent reference from a temporary id to its confirmed id.
    pub fn remap_reference(&mut self, from: &TaskId, to: &TaskId) {
        if let Some(Some(parent)) = &mut self.parent_task_id {
            if parent == from {
                *parent = to.clone();
            }
        }
    }
}
