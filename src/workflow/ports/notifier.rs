//! Notification sink port.
//!
//! One-way, best-effort delivery: the cascade service logs and swallows
//! sink failures, so an unreachable sink can never affect task state.

use crate::workflow::domain::{FlowId, TaskId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Kinds of signals the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A task was assigned (at creation or by reassignment).
    Assigned,
    /// A task's blocked flag flipped to true.
    Blocked,
    /// A task's blocked flag flipped to false.
    Unblocked,
    /// A task reached `completed`.
    Completed,
    /// A milestone task reached `completed`.
    MilestoneCompleted,
}

/// One signal about one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// What happened.
    pub kind: NotificationKind,
    /// Task the signal is about.
    pub task_id: TaskId,
    /// Owning flow, when the task has one.
    pub flow_id: Option<FlowId>,
    /// Current assignee of the task, when any.
    pub assignee_id: Option<UserId>,
    /// User whose change triggered the signal.
    pub actor_id: UserId,
    /// Free-form payload for sink-specific context.
    pub extra: Option<serde_json::Value>,
}

/// Error returned by sink implementations on delivery failure.
#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(Arc<dyn std::error::Error + Send + Sync>);

impl NotificationError {
    /// Wraps a delivery error.
    #[must_use]
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// One-way notification delivery contract.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] on delivery failure; callers treat
    /// this as best-effort and never propagate it.
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}
