//! Agenda routing: assigns each scored task to a time bucket.

use crate::model::{Agenda, ContextMap, IdeaAnalysis, Priority, RoutedTask, ScoredTask, Timeframe};

/// Title phrases that pin a task to today.
pub const TODAY_PHRASES: &[&str] = &["tonight", "this evening"];

/// Title phrases that pin a task to tomorrow.
pub const TOMORROW_PHRASES: &[&str] = &["tomorrow", "next day"];

/// Title phrases that pin a task to this week.
pub const THIS_WEEK_PHRASES: &[&str] = &["next week", "this week"];

/// Route every scored task.
///
/// Per task: default `Upcoming`, then the timeframe mapping, then a title
/// keyword override, and finally `MUST` tasks still on `Upcoming` are
/// promoted to `Today`. The keyword step may undo the timeframe mapping.
///
/// # Example
///
/// ```
/// use taskstream::model::{Agenda, ContextMap, IdeaAnalysis, Priority, ScoredTask, TaskCandidate, TaskType};
/// use taskstream::pipeline::route_agenda;
///
/// let scored = ScoredTask {
///     candidate: TaskCandidate::new("Call mom tonight", "someday"),
///     priority: Priority::Could,
///     task_type: TaskType::Normal,
/// };
/// let routed = route_agenda(vec![scored], &ContextMap::default(), &IdeaAnalysis::default());
/// assert_eq!(routed[0].agenda, Agenda::Today);
/// ```
#[must_use]
pub fn route_agenda(
    scored: Vec<ScoredTask>,
    _context: &ContextMap,
    _analysis: &IdeaAnalysis,
) -> Vec<RoutedTask> {
    scored
        .into_iter()
        .map(|task| {
            let agenda = route_one(&task);
            RoutedTask {
                scored: task,
                agenda,
            }
        })
        .collect()
}

fn route_one(task: &ScoredTask) -> Agenda {
    let mut agenda = match task.candidate.suggested_timeframe {
        Timeframe::Today => Agenda::Today,
        Timeframe::Tomorrow => Agenda::Tomorrow,
        Timeframe::ThisWeek => Agenda::ThisWeek,
        Timeframe::Someday => Agenda::Someday,
        Timeframe::Other(_) => Agenda::Upcoming,
    };

    if let Some(bucket) = keyword_bucket(&task.candidate.title) {
        agenda = bucket;
    }

    if task.priority == Priority::Must && agenda == Agenda::Upcoming {
        agenda = Agenda::Today;
    }

    agenda
}

/// First matching keyword group wins.
fn keyword_bucket(title: &str) -> Option<Agenda> {
    let lowered = title.to_lowercase();
    let matches = |phrases: &[&str]| phrases.iter().any(|p| lowered.contains(p));

    if matches(TODAY_PHRASES) {
        Some(Agenda::Today)
    } else if matches(TOMORROW_PHRASES) {
        Some(Agenda::Tomorrow)
    } else if matches(THIS_WEEK_PHRASES) {
        Some(Agenda::ThisWeek)
    } else {
        None
    }
}
