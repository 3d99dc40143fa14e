//! Mock implementations of the external collaborators.
//!
//! These mocks provide controllable test doubles for the remote task store
//! and the text services, enabling deterministic store and capture tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

use crate::capture::{ExtractionService, IdeaAnalysisService};
use crate::error::{RemoteError, Result, TaskstreamError};
use crate::model::{IdeaAnalysis, NewTaskInput, Task, TaskCandidate, TaskId, TaskPatch};
use crate::store::{RemoteResult, RemoteTaskStore};

/// Remote operation kinds, for scripting failures and latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Create,
    Update,
    Delete,
    List,
}

/// One call received by [`MockRemoteStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Create { title: String },
    Update { id: TaskId },
    Delete { id: TaskId },
    List,
}

#[derive(Debug, Default)]
struct RemoteState {
    tasks: BTreeMap<TaskId, Task>,
    calls: Vec<RemoteCall>,
    /// Scripted outcomes per op; `None` lets a call through.
    failures: HashMap<RemoteOp, VecDeque<Option<RemoteError>>>,
    latency: HashMap<RemoteOp, Duration>,
    reachable: bool,
}

/// In-memory authoritative store.
///
/// Assigns sequential `task-N` ids. Failures can be scripted per operation,
/// latency added per operation, and every call held behind a gate so a test
/// can observe the optimistic phase.
///
/// # Example
///
/// ```rust,ignore
/// let remote = MockRemoteStore::new()
///     .with_failure(RemoteOp::Update, RemoteError::Network("timeout".into()))
///     .with_latency(RemoteOp::Create, Duration::from_millis(50));
///
/// assert_eq!(remote.create_calls(), 0);
/// ```
#[derive(Debug)]
pub struct MockRemoteStore {
    state: Mutex<RemoteState>,
    next_id: AtomicU64,
    gate: watch::Sender<bool>,
}

impl Default for MockRemoteStore {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(RemoteState {
                reachable: true,
                ..RemoteState::default()
            }),
            next_id: AtomicU64::new(1),
            gate,
        }
    }
}

impl MockRemoteStore {
    /// Create a new reachable, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Pre-populate the server with tasks.
    #[must_use]
    pub fn with_tasks(self, tasks: Vec<Task>) -> Self {
        {
            let mut state = self.lock();
            for task in tasks {
                state.tasks.insert(task.id.clone(), task);
            }
        }
        self
    }

    /// Fail the next call of `op` with `error`. Repeated calls stack up.
    #[must_use]
    pub fn with_failure(self, op: RemoteOp, error: RemoteError) -> Self {
        self.fail_next(op, error);
        self
    }

    /// Delay every call of `op`.
    #[must_use]
    pub fn with_latency(self, op: RemoteOp, latency: Duration) -> Self {
        self.lock().latency.insert(op, latency);
        self
    }

    /// Script a failure after construction.
    pub fn fail_next(&self, op: RemoteOp, error: RemoteError) {
        self.lock().failures.entry(op).or_default().push_back(Some(error));
    }

    /// Let the next `successes` calls of `op` through, then fail one.
    pub fn fail_after(&self, op: RemoteOp, successes: usize, error: RemoteError) {
        let mut state = self.lock();
        let script = state.failures.entry(op).or_default();
        script.extend(std::iter::repeat_with(|| None).take(successes));
        script.push_back(Some(error));
    }

    /// While unreachable, every call fails with a network error.
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Hold every call that has not yet passed the gate.
    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    /// Let held calls proceed.
    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    pub fn create_calls(&self) -> usize {
        self.count(|c| matches!(c, RemoteCall::Create { .. }))
    }

    pub fn update_calls(&self) -> usize {
        self.count(|c| matches!(c, RemoteCall::Update { .. }))
    }

    pub fn delete_calls(&self) -> usize {
        self.count(|c| matches!(c, RemoteCall::Delete { .. }))
    }

    fn count(&self, filter: impl Fn(&RemoteCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| filter(c)).count()
    }

    /// Server-side value of a task.
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.lock().tasks.get(id).cloned()
    }

    /// Server-side tasks ordered by id.
    pub fn server_tasks(&self) -> Vec<Task> {
        self.lock().tasks.values().cloned().collect()
    }

    /// Record the call, wait for the gate and latency, then report any
    /// scripted failure.
    async fn enter(&self, op: RemoteOp, call: RemoteCall) -> RemoteResult<()> {
        let latency = {
            let mut state = self.lock();
            state.calls.push(call);
            state.latency.get(&op).copied()
        };

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        if !state.reachable {
            return Err(RemoteError::Network("remote unreachable".into()));
        }
        match state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(Some(error)) => Err(error),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteTaskStore for MockRemoteStore {
    async fn create(&self, input: &NewTaskInput) -> RemoteResult<Task> {
        self.enter(
            RemoteOp::Create,
            RemoteCall::Create {
                title: input.title.clone(),
            },
        )
        .await?;
        let id = TaskId::new(format!("task-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        let task = Task::from_input(id.clone(), input, Utc::now());
        self.lock().tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> RemoteResult<Task> {
        self.enter(RemoteOp::Update, RemoteCall::Update { id: id.clone() })
            .await?;
        let mut state = self.lock();
        let task = state
            .tasks
            .get_mut(id)
            .ok_or_else(|| RemoteError::NotFound { id: id.to_string() })?;
        patch.apply_to(task);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> RemoteResult<()> {
        self.enter(RemoteOp::Delete, RemoteCall::Delete { id: id.clone() })
            .await?;
        self.lock()
            .tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound { id: id.to_string() })
    }

    async fn list(&self) -> RemoteResult<Vec<Task>> {
        self.enter(RemoteOp::List, RemoteCall::List).await?;
        Ok(self.server_tasks())
    }
}

/// Mock extraction service returning a fixed candidate list.
///
/// # Example
///
/// ```rust,ignore
/// let extraction = MockExtractionService::new()
///     .with_candidates(vec![TaskCandidate::new("Buy milk", "today")]);
/// ```
#[derive(Debug, Default)]
pub struct MockExtractionService {
    candidates: Vec<TaskCandidate>,
    error: Option<String>,
    call_count: AtomicU32,
}

impl MockExtractionService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<TaskCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Configure the mock to fail.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionService for MockExtractionService {
    async fn extract(&self, _text: &str) -> Result<Vec<TaskCandidate>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(error) => Err(TaskstreamError::Other(anyhow::anyhow!("{}", error))),
            None => Ok(self.candidates.clone()),
        }
    }
}

/// Mock idea analysis service.
#[derive(Debug, Default)]
pub struct MockIdeaAnalysisService {
    analysis: IdeaAnalysis,
    error: Option<String>,
    call_count: AtomicU32,
}

impl MockIdeaAnalysisService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_analysis(mut self, analysis: IdeaAnalysis) -> Self {
        self.analysis = analysis;
        self
    }

    /// Configure the mock to fail.
    #[must_use]
    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdeaAnalysisService for MockIdeaAnalysisService {
    async fn analyze(&self, _text: &str) -> Result<IdeaAnalysis> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(error) => Err(TaskstreamError::Other(anyhow::anyhow!("{}", error))),
            None => Ok(self.analysis.clone()),
        }
    }
}
