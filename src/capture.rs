//! Capture flow: free text in, persisted tasks out.
//!
//! Extraction and idea analysis are external services. Both run
//! concurrently; their results go through [`classify`], the validation
//! boundary, and finally [`OptimisticTaskStore::create_tasks`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Result, TaskstreamError};
use crate::model::{ContextMap, IdeaAnalysis, NewTaskInput, RoutedTask, Task, TaskCandidate};
use crate::pipeline::classify;
use crate::store::OptimisticTaskStore;

/// Turns free text into task candidates.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<TaskCandidate>>;
}

/// Reads tone, topics and decisions out of free text.
#[async_trait]
pub trait IdeaAnalysisService: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<IdeaAnalysis>;
}

/// A routed task the validation boundary refused.
#[derive(Debug)]
pub struct RejectedTask {
    pub task: RoutedTask,
    pub error: TaskstreamError,
}

/// Result of one [`CapturePipeline::capture`] call.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub context: ContextMap,
    pub created: Vec<Task>,
    pub rejected: Vec<RejectedTask>,
}

/// Wires the external services, the pipeline and the store together.
pub struct CapturePipeline {
    extraction: Arc<dyn ExtractionService>,
    analysis: Arc<dyn IdeaAnalysisService>,
    store: Arc<OptimisticTaskStore>,
}

impl CapturePipeline {
    pub fn new(
        extraction: Arc<dyn ExtractionService>,
        analysis: Arc<dyn IdeaAnalysisService>,
        store: Arc<OptimisticTaskStore>,
    ) -> Self {
        Self {
            extraction,
            analysis,
            store,
        }
    }

    /// Capture `text` as tasks.
    ///
    /// An analysis failure degrades to a neutral analysis; an extraction
    /// failure or a store failure is returned.
    pub async fn capture(&self, text: &str) -> Result<CaptureOutcome> {
        let (candidates, analysis) =
            tokio::join!(self.extraction.extract(text), self.analysis.analyze(text));
        let candidates = candidates?;
        let analysis = analysis.unwrap_or_else(|e| {
            warn!("Idea analysis failed, continuing with neutral tone: {}", e);
            IdeaAnalysis::default()
        });
        debug!(candidates = candidates.len(), "Extracted task candidates");

        let batch = classify(&candidates, &analysis);
        let mut inputs: Vec<NewTaskInput> = Vec::with_capacity(batch.tasks.len());
        let mut rejected = Vec::new();
        for task in batch.tasks {
            match task.clone().into_new_task() {
                Ok(input) => inputs.push(input),
                Err(error) => {
                    warn!(title = %task.title(), "Rejected routed task: {}", error);
                    rejected.push(RejectedTask { task, error });
                }
            }
        }

        let created = self.store.create_tasks(inputs).await?;
        info!(
            created = created.len(),
            rejected = rejected.len(),
            "Captured tasks"
        );
        Ok(CaptureOutcome {
            context: batch.context,
            created,
            rejected,
        })
    }
}
