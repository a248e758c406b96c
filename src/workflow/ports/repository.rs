//! Repository ports for the task store collaborator.
//!
//! Updates are conditional on the record's concurrency token: an update
//! whose `version` no longer matches the stored record fails with a
//! version conflict instead of silently losing a concurrent write. There
//! is no quiet-write flag; the cascade service is the only trigger of
//! further propagation, so a repository update issued from inside a
//! cascade step never re-enters the engine by construction.

use crate::workflow::domain::{Flow, FlowId, Task, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Result type for flow repository operations.
pub type FlowRepositoryResult<T> = Result<T, FlowRepositoryError>;

/// Task persistence contract.
///
/// Lookup methods exclude soft-deleted records, with the exception of
/// [`TaskRepository::find_by_flow`], which the delete/restore cascade
/// uses to reach them.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID
    /// already exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Conditionally updates an existing task and returns the stored
    /// record with its concurrency token advanced.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist and [`TaskRepositoryError::VersionConflict`] when the stored
    /// record changed since `task` was read.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<Task>;

    /// Finds a task by identifier. Returns `None` when absent or
    /// soft-deleted.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns all tasks whose `depends_on_task_id` names the given task.
    async fn find_dependents_on_task(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns all tasks whose `depends_on_milestone_id` names the given
    /// task.
    async fn find_dependents_on_milestone(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the direct children of the given task.
    async fn find_children(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the root-level tasks (no hierarchy parent) of a flow.
    async fn find_flow_roots(&self, flow_id: FlowId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns every task of a flow, soft-deleted records included.
    async fn find_by_flow(&self, flow_id: FlowId) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The stored record changed since it was read.
    #[error("version conflict on task {id}: held {held}, stored {stored}")]
    VersionConflict {
        /// Task whose update was rejected.
        id: TaskId,
        /// Token carried by the rejected update.
        held: u64,
        /// Token of the stored record.
        stored: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Flow persistence contract.
#[async_trait]
pub trait FlowRepository: Send + Sync {
    /// Stores a new flow.
    ///
    /// # Errors
    ///
    /// Returns [`FlowRepositoryError::DuplicateFlow`] when the flow ID
    /// already exists.
    async fn store(&self, flow: &Flow) -> FlowRepositoryResult<()>;

    /// Conditionally updates an existing flow and returns the stored
    /// record with its concurrency token advanced.
    ///
    /// # Errors
    ///
    /// Returns [`FlowRepositoryError::NotFound`] when the flow does not
    /// exist and [`FlowRepositoryError::VersionConflict`] when the stored
    /// record changed since `flow` was read.
    async fn update(&self, flow: &Flow) -> FlowRepositoryResult<Flow>;

    /// Finds a flow by identifier, soft-deleted flows included (the
    /// restore path needs them).
    async fn find_by_id(&self, id: FlowId) -> FlowRepositoryResult<Option<Flow>>;
}

/// Errors returned by flow repository implementations.
#[derive(Debug, Clone, Error)]
pub enum FlowRepositoryError {
    /// A flow with the same identifier already exists.
    #[error("duplicate flow identifier: {0}")]
    DuplicateFlow(FlowId),

    /// The flow was not found.
    #[error("flow not found: {0}")]
    NotFound(FlowId),

    /// The stored record changed since it was read.
    #[error("version conflict on flow {id}: held {held}, stored {stored}")]
    VersionConflict {
        /// Flow whose update was rejected.
        id: FlowId,
        /// Token carried by the rejected update.
        held: u64,
        /// Token of the stored record.
        stored: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl FlowRepositoryError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
