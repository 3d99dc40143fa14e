//! Data model for candidates, classified tasks and persisted tasks.
//!
//! - [`candidate`] - extraction inputs, the context map, scored and routed tasks
//! - [`classification`] - priority, size, agenda and timeframe enums
//! - [`record`] - the [`TaskRecord`] sum type and the validation boundary
//! - [`task`] - the canonical [`Task`] and its create/update payloads

pub mod candidate;
pub mod classification;
pub mod record;
pub mod task;

pub use candidate::{ContextMap, Deadline, IdeaAnalysis, RoutedTask, ScoredTask, TaskCandidate};
pub use classification::{Agenda, Priority, TaskType, TimeSensitivity, Timeframe};
pub use record::TaskRecord;
pub use task::{NewTaskInput, Task, TaskId, TaskPatch, TEMP_ID_PREFIX};
