//! Priority scoring: assigns a [`Priority`] tier and a [`TaskType`] size to
//! each candidate.
//!
//! The rules run in a fixed sequence and later rules may overwrite earlier
//! assignments:
//!
//! 1. start at `SHOULD` / `NORMAL`
//! 2. size from word count, reminder and title keywords
//! 3. tier from the suggested timeframe and reminder flag
//! 4. escalate `SHOULD` to `MUST` under a stressed or overwhelmed tone
//!
//! `MUST` and `COULD` are never changed by the escalation step, and no
//! tone ever demotes a tier.

use crate::model::{ContextMap, IdeaAnalysis, Priority, ScoredTask, TaskCandidate, TaskType, Timeframe};

/// Titles at or below this many words may be tiny tasks.
pub const TINY_TASK_MAX_WORDS: usize = 5;

/// Titles above this many words are big tasks.
pub const BIG_TASK_MIN_WORDS: usize = 10;

/// Case-insensitive title fragments that mark a big task.
pub const BIG_TASK_MARKERS: &[&str] = &["project", "plan"];

/// Tones that escalate `SHOULD` to `MUST`.
pub const ESCALATING_TONES: &[&str] = &["stressed", "overwhelmed"];

/// Score every candidate in a batch.
///
/// The context map is accepted for pipeline symmetry; scoring is
/// per-candidate and does not read it.
#[must_use]
pub fn score_priorities(
    candidates: &[TaskCandidate],
    analysis: &IdeaAnalysis,
    _context: &ContextMap,
) -> Vec<ScoredTask> {
    let escalate = analysis
        .normalized_tone()
        .is_some_and(|tone| ESCALATING_TONES.contains(&tone.as_str()));

    candidates
        .iter()
        .map(|candidate| score_candidate(candidate, escalate))
        .collect()
}

fn score_candidate(candidate: &TaskCandidate, escalate: bool) -> ScoredTask {
    let mut priority = Priority::Should;
    let mut task_type = TaskType::Normal;

    let word_count = candidate.title.split_whitespace().count();
    let lowered = candidate.title.to_lowercase();
    let is_today = candidate.suggested_timeframe == Timeframe::Today;

    if word_count <= TINY_TASK_MAX_WORDS && !candidate.has_reminder && is_today {
        task_type = TaskType::TinyTask;
    } else if word_count > BIG_TASK_MIN_WORDS
        || BIG_TASK_MARKERS.iter().any(|m| lowered.contains(m))
    {
        task_type = TaskType::BigTask;
    }

    if is_today || candidate.has_reminder {
        priority = Priority::Must;
    } else if candidate.suggested_timeframe == Timeframe::ThisWeek {
        priority = Priority::Should;
    } else if candidate.suggested_timeframe == Timeframe::Someday {
        priority = Priority::Could;
    }

    if escalate && priority == Priority::Should {
        priority = Priority::Must;
    }

    ScoredTask {
        candidate: candidate.clone(),
        priority,
        task_type,
    }
}
