//! Closed sum type over every stage a task record passes through, and the
//! single validation boundary that turns a routed candidate into a
//! creation payload.

use serde::{Deserialize, Serialize};

use super::candidate::{RoutedTask, ScoredTask, TaskCandidate};
use super::task::{NewTaskInput, Task};
use crate::error::{Result, TaskstreamError};

/// A task record at some stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum TaskRecord {
    Candidate(TaskCandidate),
    Scored(ScoredTask),
    Routed(RoutedTask),
    Persisted(Task),
}

impl TaskRecord {
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Candidate(_) => "candidate",
            Self::Scored(_) => "scored",
            Self::Routed(_) => "routed",
            Self::Persisted(_) => "persisted",
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Candidate(c) => &c.title,
            Self::Scored(s) => &s.candidate.title,
            Self::Routed(r) => r.title(),
            Self::Persisted(t) => &t.title,
        }
    }

    /// Convert into a creation payload.
    ///
    /// Only routed records carry every required field; any other stage is
    /// rejected with a validation error.
    pub fn into_new_task(self) -> Result<NewTaskInput> {
        match self {
            Self::Routed(routed) => routed.into_new_task(),
            Self::Candidate(_) => Err(TaskstreamError::validation(
                "priority",
                "candidate has not been scored",
            )),
            Self::Scored(_) => Err(TaskstreamError::validation(
                "agenda",
                "task has not been routed",
            )),
            Self::Persisted(task) => Err(TaskstreamError::validation(
                "id",
                format!("task {} is already persisted", task.id),
            )),
        }
    }
}

impl From<RoutedTask> for TaskRecord {
    fn from(routed: RoutedTask) -> Self {
        Self::Routed(routed)
    }
}

impl RoutedTask {
    /// Validation boundary between the pipeline and the store.
    pub fn into_new_task(self) -> Result<NewTaskInput> {
        let agenda = self.agenda;
        let ScoredTask {
            candidate,
            priority,
            task_type,
        } = self.scored;

        let title = candidate.title.trim().to_string();
        if title.is_empty() {
            return Err(TaskstreamError::validation("title", "must not be empty"));
        }

        let input = NewTaskInput {
            title,
            category: candidate.suggested_category,
            priority: Some(priority),
            effort: Some(task_type),
            scheduled_bucket: Some(agenda),
            keywords: candidate.keywords,
            ..NewTaskInput::default()
        };
        input.validate()?;
        Ok(input)
    }
}
