//! Context mapping: infers projects, categories, people, deadlines and
//! time sensitivity for a batch of candidates.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{ContextMap, Deadline, IdeaAnalysis, TaskCandidate, TimeSensitivity};

/// Topics every capture tends to mention; they never become projects.
pub const BASELINE_TOPICS: &[&str] = &["Work", "Personal", "Health"];

/// Category token recorded for candidates that carry a custom category id.
pub const CUSTOM_CATEGORY: &str = "custom";

/// Tones that raise batch time sensitivity to `high`.
pub const HIGH_SENSITIVITY_TONES: &[&str] = &["stressed", "overwhelmed", "urgent"];

/// Tones that lower batch time sensitivity to `low`.
pub const LOW_SENSITIVITY_TONES: &[&str] = &["calm", "thoughtful"];

/// Format used for reminder-derived deadlines.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";

static CAPITALIZED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[A-Z]").ok());

/// Build the context map for a batch.
///
/// Rules are additive and applied in order: projects from topics,
/// categories, deadlines, related people, then the batch-level time
/// sensitivity. Missing fields count as empty; this never fails.
///
/// # Example
///
/// ```
/// use taskstream::model::{IdeaAnalysis, TaskCandidate, TimeSensitivity};
/// use taskstream::pipeline::map_context;
///
/// let analysis = IdeaAnalysis::with_tone("Urgent")
///     .with_topics(vec!["Work".into(), "Garden".into()]);
/// let context = map_context(&[TaskCandidate::new("Water plants", "today")], &analysis);
///
/// assert_eq!(context.inferred_projects, vec!["Garden".to_string()]);
/// assert_eq!(context.time_sensitivity, TimeSensitivity::High);
/// ```
#[must_use]
pub fn map_context(candidates: &[TaskCandidate], analysis: &IdeaAnalysis) -> ContextMap {
    let mut context = ContextMap {
        inferred_projects: infer_projects(analysis),
        ..ContextMap::default()
    };

    for candidate in candidates {
        if let Some(category) = &candidate.suggested_category {
            context.categories.insert(category.clone());
        }
        if candidate.custom_category_id.is_some() {
            context.categories.insert(CUSTOM_CATEGORY.to_string());
        }
    }

    context.deadlines = candidates
        .iter()
        .filter_map(|c| {
            c.reminder_time.map(|at| Deadline {
                task: c.title.clone(),
                when: at.format(DEADLINE_FORMAT).to_string(),
            })
        })
        .collect();

    for candidate in candidates.iter().filter(|c| c.has_person_name) {
        context
            .related_people
            .extend(capitalized_tokens(&candidate.title));
    }

    context.time_sensitivity = time_sensitivity(analysis);
    context
}

fn infer_projects(analysis: &IdeaAnalysis) -> Vec<String> {
    analysis
        .topics
        .iter()
        .filter(|topic| !BASELINE_TOPICS.contains(&topic.as_str()))
        .cloned()
        .collect()
}

/// Tokens starting with an ASCII capital. No name validation is attempted.
fn capitalized_tokens(title: &str) -> Vec<String> {
    let Some(re) = CAPITALIZED.as_ref() else {
        return Vec::new();
    };
    title
        .split_whitespace()
        .filter(|token| re.is_match(token))
        .map(str::to_string)
        .collect()
}

/// Batch-level time sensitivity from the emotional tone.
#[must_use]
pub fn time_sensitivity(analysis: &IdeaAnalysis) -> TimeSensitivity {
    match analysis.normalized_tone() {
        Some(tone) if HIGH_SENSITIVITY_TONES.contains(&tone.as_str()) => TimeSensitivity::High,
        Some(tone) if LOW_SENSITIVITY_TONES.contains(&tone.as_str()) => TimeSensitivity::Low,
        _ => TimeSensitivity::Normal,
    }
}
