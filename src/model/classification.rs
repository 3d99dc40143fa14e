//! Classification enums shared by the pipeline and the task model.
//!
//! - [`Priority`] - urgency tier
//! - [`TaskType`] - effort-size classification
//! - [`Agenda`] - time bucket a task is routed to
//! - [`TimeSensitivity`] - batch-level urgency derived from emotional tone
//! - [`Timeframe`] - timeframe suggested by the extraction service

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Priority
// ============================================================================

/// Urgency tier assigned by the priority scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Has to happen in the current window.
    Must,
    /// Default tier.
    #[default]
    Should,
    /// Nice to have.
    Could,
}

impl Priority {
    /// Wire label of the tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Must => "MUST",
            Self::Should => "SHOULD",
            Self::Could => "COULD",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Task Type
// ============================================================================

/// Effort-size classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Short, same-day task without a reminder.
    TinyTask,
    #[default]
    Normal,
    /// Long or project-like task.
    BigTask,
}

impl TaskType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TinyTask => "TINY_TASK",
            Self::Normal => "NORMAL",
            Self::BigTask => "BIG_TASK",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Agenda
// ============================================================================

/// Time bucket a task is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Agenda {
    Today,
    Tomorrow,
    ThisWeek,
    /// Fallback bucket when nothing else matched.
    #[default]
    Upcoming,
    Someday,
}

impl Agenda {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Tomorrow => "Tomorrow",
            Self::ThisWeek => "ThisWeek",
            Self::Upcoming => "Upcoming",
            Self::Someday => "Someday",
        }
    }
}

impl fmt::Display for Agenda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Time Sensitivity
// ============================================================================

/// Batch-level urgency classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSensitivity {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for TimeSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
        }
    }
}

// ============================================================================
// Timeframe
// ============================================================================

/// Timeframe suggested by the extraction service.
///
/// Matching is exact: only the four known literals map to a variant, any
/// other value is carried verbatim in [`Timeframe::Other`].
///
/// # Example
///
/// ```
/// use taskstream::model::Timeframe;
///
/// assert_eq!(Timeframe::from("this week"), Timeframe::ThisWeek);
/// assert_eq!(Timeframe::from("Today"), Timeframe::Other("Today".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Timeframe {
    Today,
    Tomorrow,
    ThisWeek,
    Someday,
    Other(String),
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl Timeframe {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::ThisWeek => "this week",
            Self::Someday => "someday",
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for Timeframe {
    fn from(raw: &str) -> Self {
        match raw {
            "today" => Self::Today,
            "tomorrow" => Self::Tomorrow,
            "this week" => Self::ThisWeek,
            "someday" => Self::Someday,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Timeframe {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<Timeframe> for String {
    fn from(timeframe: Timeframe) -> Self {
        timeframe.as_str().to_string()
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(serde_json::to_string(&Priority::Must).unwrap(), "\"MUST\"");
        let parsed: Priority = serde_json::from_str("\"COULD\"").unwrap();
        assert_eq!(parsed, Priority::Could);
    }

    #[test]
    fn test_task_type_wire_format() {
        assert_eq!(
            serde_json::to_string(&TaskType::TinyTask).unwrap(),
            "\"TINY_TASK\""
        );
        assert_eq!(TaskType::BigTask.to_string(), "BIG_TASK");
    }

    #[test]
    fn test_timeframe_parsing_is_exact() {
        assert_eq!(Timeframe::from("today"), Timeframe::Today);
        assert_eq!(Timeframe::from("someday"), Timeframe::Someday);
        assert_eq!(
            Timeframe::from("next month"),
            Timeframe::Other("next month".into())
        );
        assert_eq!(Timeframe::from("TODAY"), Timeframe::Other("TODAY".into()));
    }

    #[test]
    fn test_timeframe_serde() {
        let tf: Timeframe = serde_json::from_str("\"this week\"").unwrap();
        assert_eq!(tf, Timeframe::ThisWeek);
        assert_eq!(serde_json::to_string(&tf).unwrap(), "\"this week\"");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Priority::default(), Priority::Should);
        assert_eq!(TaskType::default(), TaskType::Normal);
        assert_eq!(Agenda::default(), Agenda::Upcoming);
        assert_eq!(TimeSensitivity::default(), TimeSensitivity::Normal);
    }
}
