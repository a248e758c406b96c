//! Error types for workflow domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing and mutating domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The progress value lies outside 0-100.
    #[error("progress must be between 0 and 100, got {0}")]
    InvalidProgress(u8),

    /// The requested status transition is not permitted by the state
    /// machine.
    #[error("task {task_id}: invalid status transition {from:?} -> {to:?}")]
    InvalidStatusTransition {
        /// Task whose transition was rejected.
        task_id: TaskId,
        /// Status before the request.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// A task referenced itself as its own dependency.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),
}

/// Error returned while parsing persisted status strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct ParseStatusError(pub String);
