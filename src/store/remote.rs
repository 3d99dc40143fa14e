//! Remote authoritative task store abstraction.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::model::{NewTaskInput, Task, TaskId, TaskPatch};

/// Result type for remote store calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Authoritative task store, scoped to one authenticated user.
///
/// Implementations must report [`RemoteError::NotFound`] for missing
/// entities and [`RemoteError::Network`] for transient failures; the offline
/// queue drops the former and retries the latter.
///
/// # Example
///
/// ```rust,ignore
/// use taskstream::store::RemoteTaskStore;
///
/// async fn rename(remote: &dyn RemoteTaskStore, id: &TaskId) -> RemoteResult<Task> {
///     remote.update(id, &TaskPatch::title("Renamed")).await
/// }
/// ```
#[async_trait]
pub trait RemoteTaskStore: Send + Sync {
    /// Create a task and return the server record.
    async fn create(&self, input: &NewTaskInput) -> RemoteResult<Task>;

    /// Apply a partial update and return the server record.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> RemoteResult<Task>;

    /// Delete a task.
    async fn delete(&self, id: &TaskId) -> RemoteResult<()>;

    /// Every task owned by the user.
    async fn list(&self) -> RemoteResult<Vec<Task>>;
}
