//! taskstream - task intelligence pipeline and optimistic task store
//!
//! Turns loosely structured task candidates into prioritized, scheduled
//! tasks, and persists them through a local-first store that stays usable
//! offline.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`model`] - Candidates, classified tasks, persisted tasks and patches
//! - [`pipeline`] - Context mapping, priority scoring and agenda routing
//! - [`store`] - Optimistic task store with rollback and confirmed events
//! - [`queue`] - Durable FIFO of mutations waiting for connectivity
//! - [`capture`] - Extraction and analysis services wired to the store
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (mocks, fixtures)
//!
//! # Example
//!
//! ```rust,ignore
//! use taskstream::pipeline::classify;
//! use taskstream::model::{IdeaAnalysis, TaskCandidate};
//! use taskstream::store::OptimisticTaskStore;
//!
//! let batch = classify(&[TaskCandidate::new("Buy milk", "today")], &IdeaAnalysis::default());
//! let inputs = batch
//!     .tasks
//!     .into_iter()
//!     .map(|task| task.into_new_task())
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let store = OptimisticTaskStore::open("user-1", remote, &StoreConfig::default())?;
//! let created = store.create_tasks(inputs).await?;
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod queue;
pub mod store;
pub mod testing;

// Re-export commonly used types
pub use error::{RemoteError, Result, TaskstreamError};

pub use config::{EngineConfig, StoreConfig};

pub use model::{
    Agenda, ContextMap, IdeaAnalysis, NewTaskInput, Priority, RoutedTask, ScoredTask, Task,
    TaskCandidate, TaskId, TaskPatch, TaskRecord, TaskType, TimeSensitivity, Timeframe,
};

pub use pipeline::{classify, ClassifiedBatch};

pub use store::{
    CachedTask, Connectivity, OptimisticTaskStore, RemoteTaskStore, TaskEvent, TaskEventKind,
};

pub use queue::{DrainReport, MutationKind, MutationState, OfflineQueue, QueuedMutation};

pub use capture::{CaptureOutcome, CapturePipeline, ExtractionService, IdeaAnalysisService};
