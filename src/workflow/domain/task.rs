//! Task aggregate root.

use super::{FlowId, Progress, TaskDomainError, TaskId, TaskStatus, UserId, progress};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Caller-supplied fields for a task that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    flow_id: Option<FlowId>,
    parent_task_id: Option<TaskId>,
    assignee_id: Option<UserId>,
    depends_on_task_id: Option<TaskId>,
    depends_on_milestone_id: Option<TaskId>,
    is_milestone: bool,
}

impl TaskDraft {
    /// Creates an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the draft to a flow as a root-level task.
    #[must_use]
    pub const fn in_flow(mut self, flow_id: FlowId) -> Self {
        self.flow_id = Some(flow_id);
        self
    }

    /// Nests the draft under a parent task.
    #[must_use]
    pub const fn under_parent(mut self, parent_task_id: TaskId) -> Self {
        self.parent_task_id = Some(parent_task_id);
        self
    }

    /// Assigns the draft to a user.
    #[must_use]
    pub const fn assigned_to(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Gates the draft on completion of another task.
    #[must_use]
    pub const fn depending_on_task(mut self, task_id: TaskId) -> Self {
        self.depends_on_task_id = Some(task_id);
        self
    }

    /// Gates the draft on completion of a milestone.
    #[must_use]
    pub const fn depending_on_milestone(mut self, milestone_id: TaskId) -> Self {
        self.depends_on_milestone_id = Some(milestone_id);
        self
    }

    /// Marks the draft as a milestone other tasks may depend on.
    #[must_use]
    pub const fn as_milestone(mut self) -> Self {
        self.is_milestone = true;
        self
    }

    /// Returns the precedent-task reference, if any.
    #[must_use]
    pub const fn depends_on_task_id(&self) -> Option<TaskId> {
        self.depends_on_task_id
    }

    /// Returns the milestone reference, if any.
    #[must_use]
    pub const fn depends_on_milestone_id(&self) -> Option<TaskId> {
        self.depends_on_milestone_id
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    status: TaskStatus,
    progress: Progress,
    is_blocked: bool,
    is_milestone: bool,
    depends_on_task_id: Option<TaskId>,
    depends_on_milestone_id: Option<TaskId>,
    parent_task_id: Option<TaskId>,
    flow_id: Option<FlowId>,
    assignee_id: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    version: u64,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted progress percentage.
    pub progress: Progress,
    /// Persisted blocked flag.
    pub is_blocked: bool,
    /// Persisted milestone flag.
    pub is_milestone: bool,
    /// Persisted precedent-task reference.
    pub depends_on_task_id: Option<TaskId>,
    /// Persisted milestone reference.
    pub depends_on_milestone_id: Option<TaskId>,
    /// Persisted hierarchy parent.
    pub parent_task_id: Option<TaskId>,
    /// Persisted owning flow.
    pub flow_id: Option<FlowId>,
    /// Persisted assignee.
    pub assignee_id: Option<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Persisted concurrency token.
    pub version: u64,
}

impl Task {
    /// Creates a new pending task from a draft.
    ///
    /// A task carrying any dependency reference starts life blocked; the
    /// first recompute trigger reconciles the flag against the targets'
    /// actual statuses.
    #[must_use]
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let is_blocked =
            draft.depends_on_task_id.is_some() || draft.depends_on_milestone_id.is_some();

        Self {
            id: TaskId::new(),
            status: TaskStatus::Pending,
            progress: Progress::ZERO,
            is_blocked,
            is_milestone: draft.is_milestone,
            depends_on_task_id: draft.depends_on_task_id,
            depends_on_milestone_id: draft.depends_on_milestone_id,
            parent_task_id: draft.parent_task_id,
            flow_id: draft.flow_id,
            assignee_id: draft.assignee_id,
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
            version: 0,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            status: data.status,
            progress: data.progress,
            is_blocked: data.is_blocked,
            is_milestone: data.is_milestone,
            depends_on_task_id: data.depends_on_task_id,
            depends_on_milestone_id: data.depends_on_milestone_id,
            parent_task_id: data.parent_task_id,
            flow_id: data.flow_id,
            assignee_id: data.assignee_id,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
            version: data.version,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the progress percentage.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the cached blocked flag.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.is_blocked
    }

    /// Returns whether other tasks may depend on this one as a milestone.
    #[must_use]
    pub const fn is_milestone(&self) -> bool {
        self.is_milestone
    }

    /// Returns the precedent-task reference, if any.
    #[must_use]
    pub const fn depends_on_task_id(&self) -> Option<TaskId> {
        self.depends_on_task_id
    }

    /// Returns the milestone reference, if any.
    #[must_use]
    pub const fn depends_on_milestone_id(&self) -> Option<TaskId> {
        self.depends_on_milestone_id
    }

    /// Returns the hierarchy parent, if any.
    #[must_use]
    pub const fn parent_task_id(&self) -> Option<TaskId> {
        self.parent_task_id
    }

    /// Returns the owning flow, if any.
    #[must_use]
    pub const fn flow_id(&self) -> Option<FlowId> {
        self.flow_id
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee_id(&self) -> Option<UserId> {
        self.assignee_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the task is soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the soft-delete timestamp, if set.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns the optimistic-concurrency token.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Changes the lifecycle status, applying the leaf progress policy.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the
    /// state machine forbids the move.
    pub fn change_status(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.progress = progress::for_status(target, self.progress);
        self.touch(clock);
        Ok(())
    }

    /// Overrides the progress percentage (manual fine-grained progress).
    pub fn set_progress(&mut self, value: Progress, clock: &impl Clock) {
        self.progress = value;
        self.touch(clock);
    }

    /// Applies an aggregate progress computed from children, nudging the
    /// status along the derived-status rules. Used for parent tasks only;
    /// the aggregate supersedes the status-table progress.
    pub fn apply_aggregate(&mut self, aggregate: Progress, clock: &impl Clock) {
        self.progress = aggregate;
        if let Some(next) = progress::derived_status(aggregate, self.status) {
            self.status = next;
        }
        self.touch(clock);
    }

    /// Replaces both dependency references.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfDependency`] when either reference
    /// names this task itself.
    pub fn set_dependencies(
        &mut self,
        depends_on_task_id: Option<TaskId>,
        depends_on_milestone_id: Option<TaskId>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if depends_on_task_id == Some(self.id) || depends_on_milestone_id == Some(self.id) {
            return Err(TaskDomainError::SelfDependency(self.id));
        }
        self.depends_on_task_id = depends_on_task_id;
        self.depends_on_milestone_id = depends_on_milestone_id;
        self.touch(clock);
        Ok(())
    }

    /// Overwrites the cached blocked flag.
    pub fn set_blocked(&mut self, blocked: bool, clock: &impl Clock) {
        self.is_blocked = blocked;
        self.touch(clock);
    }

    /// Reassigns the task.
    pub fn assign(&mut self, assignee_id: Option<UserId>, clock: &impl Clock) {
        self.assignee_id = assignee_id;
        self.touch(clock);
    }

    /// Soft-deletes the task. Idempotent: an existing deletion timestamp
    /// is preserved.
    pub fn mark_deleted(&mut self, clock: &impl Clock) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(clock.utc());
            self.touch(clock);
        }
    }

    /// Clears a soft deletion.
    pub fn restore(&mut self, clock: &impl Clock) {
        if self.deleted_at.is_some() {
            self.deleted_at = None;
            self.touch(clock);
        }
    }

    /// Returns a copy with the concurrency token advanced. Called by
    /// repository adapters on successful conditional update.
    #[must_use]
    pub const fn with_bumped_version(mut self) -> Self {
        self.version += 1;
        self
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
