//! Custom error types for taskstream.
//!
//! This module provides structured error types that let callers tell
//! recoverable store failures (rollback, requeue) apart from the ones that
//! need user-visible handling.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Error returned by a [`RemoteTaskStore`](crate::store::RemoteTaskStore)
/// implementation.
///
/// Remote stores must distinguish "the entity does not exist" from
/// "the network is unavailable" so the offline queue can decide between
/// dropping and requeueing a mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Target entity does not exist remotely.
    #[error("Remote entity not found: {id}")]
    NotFound { id: String },

    /// Remote store is unreachable or timed out.
    #[error("Network unavailable: {0}")]
    Network(String),

    /// Remote rejected the mutation because its state is newer.
    #[error("Remote conflict: {0}")]
    Conflict(String),
}

/// Main error type for taskstream operations
#[derive(Error, Debug)]
pub enum TaskstreamError {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Malformed input rejected before any cache mutation
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    /// Task id is not present in the local cache
    #[error("Task not found in cache: {id}")]
    TaskNotFound { id: String },

    /// Mutation was computed against an outdated revision
    #[error("Stale revision for task {id}: expected {expected}, found {actual}")]
    StaleRevision {
        id: String,
        expected: u64,
        actual: u64,
    },

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// Remote store unreachable
    #[error("Network error: {message}")]
    Network { message: String },

    /// Remote rejected the mutation due to stale server-side state
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Remote reported that the entity does not exist
    #[error("Remote task not found: {id}")]
    RemoteNotFound { id: String },

    // =========================================================================
    // Queue Errors
    // =========================================================================
    /// Replaying a queued mutation failed
    #[error("Queue replay failed for mutation {mutation_id}: {message}")]
    QueueReplay {
        mutation_id: Uuid,
        message: String,
        transient: bool,
    },

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Store was closed for this user session
    #[error("Task store session is closed")]
    SessionClosed,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML error wrapper
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RemoteError> for TaskstreamError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound { id } => Self::RemoteNotFound { id },
            RemoteError::Network(message) => Self::Network { message },
            RemoteError::Conflict(message) => Self::Conflict { message },
        }
    }
}

impl TaskstreamError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a task-not-found error
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::TaskNotFound { id: id.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a terminal replay error
    pub fn replay_terminal(mutation_id: Uuid, message: impl Into<String>) -> Self {
        Self::QueueReplay {
            mutation_id,
            message: message.into(),
            transient: false,
        }
    }

    /// Create a transient replay error
    pub fn replay_transient(mutation_id: Uuid, message: impl Into<String>) -> Self {
        Self::QueueReplay {
            mutation_id,
            message: message.into(),
            transient: true,
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if retrying later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::QueueReplay { transient: true, .. }
        )
    }

    /// Check if a queued mutation failing with this error should be dropped
    pub fn is_terminal_for_replay(&self) -> bool {
        matches!(
            self,
            Self::RemoteNotFound { .. }
                | Self::Conflict { .. }
                | Self::Validation { .. }
                | Self::QueueReplay {
                    transient: false,
                    ..
                }
        )
    }

    /// Check if the caller should reload remote truth before retrying
    pub fn requires_refresh(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::StaleRevision { .. })
    }

    /// Check if this error is meant for user-visible handling
    pub fn surfaces_to_caller(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::Validation { .. } | Self::StaleRevision { .. }
        )
    }
}

/// Type alias for taskstream results
pub type Result<T> = std::result::Result<T, TaskstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TaskstreamError::StaleRevision {
            id: "task-1".into(),
            expected: 3,
            actual: 5,
        };
        assert!(err.to_string().contains("task-1"));
        assert!(err.to_string().contains("expected 3"));
    }

    #[test]
    fn test_remote_error_conversion() {
        let err: TaskstreamError = RemoteError::Network("timeout".into()).into();
        assert!(matches!(err, TaskstreamError::Network { .. }));
        assert!(err.is_transient());

        let err: TaskstreamError = RemoteError::NotFound { id: "x".into() }.into();
        assert!(matches!(err, TaskstreamError::RemoteNotFound { .. }));
        assert!(err.is_terminal_for_replay());

        let err: TaskstreamError = RemoteError::Conflict("stale".into()).into();
        assert!(err.requires_refresh());
        assert!(err.surfaces_to_caller());
    }

    #[test]
    fn test_network_error_is_not_surfaced() {
        let err = TaskstreamError::Network {
            message: "offline".into(),
        };
        assert!(!err.surfaces_to_caller());
        assert!(!err.is_terminal_for_replay());
    }

    #[test]
    fn test_replay_helpers() {
        let id = Uuid::new_v4();
        assert!(TaskstreamError::replay_transient(id, "down").is_transient());
        let terminal = TaskstreamError::replay_terminal(id, "gone");
        assert!(terminal.is_terminal_for_replay());
        assert!(!terminal.is_transient());
    }

    #[test]
    fn test_validation_error() {
        let err = TaskstreamError::validation("title", "must not be empty");
        if let TaskstreamError::Validation { field, reason } = err {
            assert_eq!(field, "title");
            assert_eq!(reason, "must not be empty");
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/tmp/config.toml");
        let err = TaskstreamError::config_with_path("bad value", path.clone());
        if let TaskstreamError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "bad value");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: TaskstreamError = io_err.into();
        assert!(matches!(err, TaskstreamError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
