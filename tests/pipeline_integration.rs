//! Integration tests for the classification pipeline.

use chrono::{TimeZone, Utc};
use taskstream::model::{
    Agenda, IdeaAnalysis, Priority, TaskCandidate, TaskRecord, TaskType, TimeSensitivity,
};
use taskstream::pipeline::{classify, map_context, route_agenda, score_priorities};
use taskstream::TaskstreamError;

fn single(candidate: TaskCandidate, analysis: &IdeaAnalysis) -> taskstream::RoutedTask {
    classify(&[candidate], analysis).tasks.remove(0)
}

// ============================================================
// Classification properties
// ============================================================

#[test]
fn test_tiny_task() {
    let task = single(TaskCandidate::new("Buy milk", "today"), &IdeaAnalysis::default());
    assert_eq!(task.task_type(), TaskType::TinyTask);
    assert_eq!(task.priority(), Priority::Must);
    assert_eq!(task.agenda, Agenda::Today);
}

#[test]
fn test_big_task_by_keyword() {
    let task = single(
        TaskCandidate::new(
            "Sketch a plan for moving the whole team to the new office space",
            "this week",
        ),
        &IdeaAnalysis::default(),
    );
    assert_eq!(task.task_type(), TaskType::BigTask);
    assert_eq!(task.priority(), Priority::Should);
    assert_eq!(task.agenda, Agenda::ThisWeek);
}

#[test]
fn test_keyword_override_beats_timeframe() {
    let task = single(
        TaskCandidate::new("Call mom tonight", "someday"),
        &IdeaAnalysis::default(),
    );
    assert_eq!(task.agenda, Agenda::Today);
    assert_eq!(task.priority(), Priority::Could);
}

#[test]
fn test_stressed_tone_escalates_only_should() {
    let overwhelmed = IdeaAnalysis::with_tone("Overwhelmed");

    let should = single(TaskCandidate::new("x y z", "this week"), &overwhelmed);
    assert_eq!(should.priority(), Priority::Must);
    assert_eq!(should.agenda, Agenda::ThisWeek);

    let could = single(TaskCandidate::new("x y z", "someday"), &overwhelmed);
    assert_eq!(could.priority(), Priority::Could);
}

#[test]
fn test_calm_tone_never_demotes() {
    let task = single(
        TaskCandidate::new("Pay rent", "today"),
        &IdeaAnalysis::with_tone("calm"),
    );
    assert_eq!(task.priority(), Priority::Must);
}

#[test]
fn test_unknown_timeframe_promotes_must_to_today() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 17, 30, 0).single().unwrap();
    let task = single(
        TaskCandidate::new("Pick up the parcel", "whenever").with_reminder(at),
        &IdeaAnalysis::default(),
    );
    assert_eq!(task.priority(), Priority::Must);
    assert_eq!(task.agenda, Agenda::Today);
}

#[test]
fn test_unknown_timeframe_stays_upcoming() {
    let task = single(
        TaskCandidate::new("Look into bikes", "next month"),
        &IdeaAnalysis::default(),
    );
    assert_eq!(task.priority(), Priority::Should);
    assert_eq!(task.agenda, Agenda::Upcoming);
}

// ============================================================
// Context map
// ============================================================

#[test]
fn test_context_map_collects_everything() {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().unwrap();
    let candidates = vec![
        TaskCandidate::new("Email Sam and Priya", "today")
            .with_person_name()
            .with_category("Work"),
        TaskCandidate::new("Dentist", "tomorrow")
            .with_reminder(at)
            .with_custom_category("cat-7"),
    ];
    let analysis = IdeaAnalysis::with_tone("URGENT").with_topics(vec![
        "Work".into(),
        "Garden".into(),
        "Health".into(),
    ]);

    let context = map_context(&candidates, &analysis);
    assert_eq!(context.inferred_projects, vec!["Garden".to_string()]);
    assert!(context.categories.contains("Work"));
    assert!(context.categories.contains("custom"));
    assert_eq!(
        context.related_people,
        vec!["Email".to_string(), "Sam".to_string(), "Priya".to_string()]
    );
    assert_eq!(context.deadlines.len(), 1);
    assert_eq!(context.deadlines[0].when, "2024-05-01 09:00");
    assert_eq!(context.time_sensitivity, TimeSensitivity::High);
}

#[test]
fn test_stages_compose_like_classify() {
    let candidates = vec![
        TaskCandidate::new("Buy milk", "today"),
        TaskCandidate::new("Plan the trip", "tomorrow"),
    ];
    let analysis = IdeaAnalysis::with_tone("thoughtful");

    let context = map_context(&candidates, &analysis);
    let routed = route_agenda(
        score_priorities(&candidates, &analysis, &context),
        &context,
        &analysis,
    );
    let batch = classify(&candidates, &analysis);
    assert_eq!(batch.tasks, routed);
    assert_eq!(batch.context, context);
    assert_eq!(context.time_sensitivity, TimeSensitivity::Low);
}

#[test]
fn test_empty_batch() {
    let batch = classify(&[], &IdeaAnalysis::default());
    assert!(batch.tasks.is_empty());
    assert_eq!(batch.context.time_sensitivity, TimeSensitivity::Normal);
}

// ============================================================
// Validation boundary
// ============================================================

#[test]
fn test_routed_record_becomes_input() {
    let routed = single(TaskCandidate::new("Buy milk", "today"), &IdeaAnalysis::default());
    let input = TaskRecord::from(routed).into_new_task().unwrap();
    assert_eq!(input.title, "Buy milk");
    assert_eq!(input.priority, Some(Priority::Must));
    assert_eq!(input.scheduled_bucket, Some(Agenda::Today));
}

#[test]
fn test_unrouted_record_is_rejected() {
    let err = TaskRecord::Candidate(TaskCandidate::new("Buy milk", "today"))
        .into_new_task()
        .unwrap_err();
    assert!(matches!(err, TaskstreamError::Validation { .. }));
}
