//! Task intelligence pipeline.
//!
//! ```text
//! TaskCandidate[] + IdeaAnalysis
//!        │
//!        ▼
//!   map_context ──> ContextMap
//!        │
//!        ▼
//!   score_priorities ──> ScoredTask[]
//!        │
//!        ▼
//!   route_agenda ──> RoutedTask[]
//! ```
//!
//! Every stage is a pure function. None of them can fail: missing or
//! unknown input values fall back to safe defaults.

pub mod agenda;
pub mod context;
pub mod priority;

pub use agenda::route_agenda;
pub use context::{map_context, time_sensitivity};
pub use priority::score_priorities;

use serde::{Deserialize, Serialize};

use crate::model::{ContextMap, IdeaAnalysis, RoutedTask, TaskCandidate};

/// Output of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedBatch {
    pub context: ContextMap,
    pub tasks: Vec<RoutedTask>,
}

/// Run context mapping, scoring and routing over a batch.
#[must_use]
pub fn classify(candidates: &[TaskCandidate], analysis: &IdeaAnalysis) -> ClassifiedBatch {
    let context = map_context(candidates, analysis);
    let scored = score_priorities(candidates, analysis, &context);
    let tasks = route_agenda(scored, &context, analysis);
    ClassifiedBatch { context, tasks }
}
