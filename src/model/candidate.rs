//! Pre-persistence records produced and consumed by the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::classification::{Agenda, Priority, TaskType, TimeSensitivity, Timeframe};

// ============================================================================
// Inputs
// ============================================================================

/// Unstructured task proposal from the extraction service.
///
/// Every field is optional on the wire; absent values deserialize to their
/// empty form so the pipeline never has to reject a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskCandidate {
    pub title: String,
    pub suggested_category: Option<String>,
    pub custom_category_id: Option<String>,
    pub suggested_timeframe: Timeframe,
    pub has_reminder: bool,
    pub reminder_time: Option<DateTime<Utc>>,
    pub has_person_name: bool,
    pub keywords: Vec<String>,
}

impl TaskCandidate {
    /// Create a candidate with a title and timeframe.
    pub fn new(title: impl Into<String>, timeframe: impl Into<Timeframe>) -> Self {
        Self {
            title: title.into(),
            suggested_timeframe: timeframe.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.suggested_category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_custom_category(mut self, id: impl Into<String>) -> Self {
        self.custom_category_id = Some(id.into());
        self
    }

    /// Attach a reminder. Sets `has_reminder` as well.
    #[must_use]
    pub fn with_reminder(mut self, at: DateTime<Utc>) -> Self {
        self.has_reminder = true;
        self.reminder_time = Some(at);
        self
    }

    #[must_use]
    pub fn with_person_name(mut self) -> Self {
        self.has_person_name = true;
        self
    }

    #[must_use]
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }
}

/// Output of the idea-analysis service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdeaAnalysis {
    pub topics: Vec<String>,
    pub emotional_tone: Option<String>,
    pub decisions: Vec<String>,
    pub questions: Vec<String>,
}

impl IdeaAnalysis {
    pub fn with_tone(tone: impl Into<String>) -> Self {
        Self {
            emotional_tone: Some(tone.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Lowercased emotional tone, if any.
    #[must_use]
    pub fn normalized_tone(&self) -> Option<String> {
        self.emotional_tone.as_ref().map(|t| t.trim().to_lowercase())
    }
}

// ============================================================================
// Context Map
// ============================================================================

/// A reminder-derived deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub task: String,
    pub when: String,
}

/// Derived context for a batch of candidates. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMap {
    pub inferred_projects: Vec<String>,
    pub categories: BTreeSet<String>,
    pub related_people: Vec<String>,
    pub deadlines: Vec<Deadline>,
    pub time_sensitivity: TimeSensitivity,
}

// ============================================================================
// Classified Candidates
// ============================================================================

/// A candidate with priority and size assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredTask {
    #[serde(flatten)]
    pub candidate: TaskCandidate,
    pub priority: Priority,
    #[serde(rename = "taskType")]
    pub task_type: TaskType,
}

/// A scored candidate routed to an agenda bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutedTask {
    #[serde(flatten)]
    pub scored: ScoredTask,
    pub agenda: Agenda,
}

impl RoutedTask {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.scored.candidate.title
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.scored.priority
    }

    #[must_use]
    pub fn task_type(&self) -> TaskType {
        self.scored.task_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_missing_fields_default() {
        let candidate: TaskCandidate = serde_json::from_str(r#"{"title": "Buy milk"}"#).unwrap();
        assert_eq!(candidate.title, "Buy milk");
        assert!(!candidate.has_reminder);
        assert!(candidate.keywords.is_empty());
        assert_eq!(candidate.suggested_timeframe, Timeframe::Other(String::new()));
    }

    #[test]
    fn test_candidate_builder_sets_reminder_flag() {
        let at = Utc::now();
        let candidate = TaskCandidate::new("Dentist", "tomorrow").with_reminder(at);
        assert!(candidate.has_reminder);
        assert_eq!(candidate.reminder_time, Some(at));
    }

    #[test]
    fn test_normalized_tone() {
        let analysis = IdeaAnalysis::with_tone("  Stressed ");
        assert_eq!(analysis.normalized_tone().as_deref(), Some("stressed"));
        assert_eq!(IdeaAnalysis::default().normalized_tone(), None);
    }

    #[test]
    fn test_routed_task_flattens_on_wire() {
        let routed = RoutedTask {
            scored: ScoredTask {
                candidate: TaskCandidate::new("Buy milk", "today"),
                priority: Priority::Must,
                task_type: TaskType::TinyTask,
            },
            agenda: Agenda::Today,
        };
        let json = serde_json::to_value(&routed).unwrap();
        assert_eq!(json["title"], "Buy milk");
        assert_eq!(json["priority"], "MUST");
        assert_eq!(json["taskType"], "TINY_TASK");
        assert_eq!(json["agenda"], "Today");
    }
}
