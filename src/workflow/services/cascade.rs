//! Cascade engine: the stateful orchestrator of the dependency and
//! hierarchy pipeline.
//!
//! Every mutation flows through one explicit pipeline: dependency
//! resolver, then progress policy, then persistence, then the bounded
//! post-save cascade (dependents one hop out, hierarchy one hop up).
//! Downstream failures are isolated per record and never roll back the
//! triggering write; abandoned steps self-correct on the next recompute
//! trigger that touches the affected records.

use crate::workflow::{
    domain::{
        DependencySnapshot, DependencyTarget, Flow, FlowId, Task, TaskDomainError, TaskDraft,
        TaskId, TaskStatus, UserId, dependency, progress,
    },
    ports::{
        FlowRepository, FlowRepositoryError, Notification, NotificationKind, NotificationSink,
        TaskRepository, TaskRepositoryError,
    },
};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Longest precedent chain the cycle guard will walk before giving up.
const MAX_DEPENDENCY_DEPTH: usize = 32;

/// Service-level errors for cascade operations.
#[derive(Debug, Error)]
pub enum CascadeError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Task store operation failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),

    /// Flow store operation failed.
    #[error(transparent)]
    FlowRepository(#[from] FlowRepositoryError),

    /// The addressed task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The addressed flow does not exist.
    #[error("flow not found: {0}")]
    FlowNotFound(FlowId),

    /// Setting the dependency reference would close a precedent cycle.
    #[error("dependency of task {task_id} would close a cycle")]
    DependencyCycle {
        /// Task whose reference was rejected.
        task_id: TaskId,
    },

    /// The precedent chain exceeds the bounded walk, so acyclicity could
    /// not be established.
    #[error("dependency chain of task {task_id} exceeds depth limit {limit}")]
    DependencyTooDeep {
        /// Task whose reference was rejected.
        task_id: TaskId,
        /// Depth limit of the guard walk.
        limit: usize,
    },

    /// A `depends_on_milestone_id` reference names a non-milestone task.
    #[error("task {0} is not a milestone")]
    NotAMilestone(TaskId),

    /// The previous/next pair passed to `apply_change` describes two
    /// different tasks.
    #[error("change pair mismatch: previous {previous}, next {next}")]
    MismatchedChange {
        /// Identifier of the previous state.
        previous: TaskId,
        /// Identifier of the next state.
        next: TaskId,
    },
}

/// Result type for cascade operations.
pub type CascadeResult<T> = Result<T, CascadeError>;

/// The cascade orchestrator.
///
/// Holds the task store, flow store, notification sink, and clock. All
/// mutating calls take an explicit `actor`, stamped on every emitted
/// notification; there is no ambient "current user" context.
#[derive(Clone)]
pub struct CascadeEngine<T, F, N, C>
where
    T: TaskRepository,
    F: FlowRepository,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    flows: Arc<F>,
    sink: Arc<N>,
    clock: Arc<C>,
}

impl<T, F, N, C> CascadeEngine<T, F, N, C>
where
    T: TaskRepository,
    F: FlowRepository,
    N: NotificationSink,
    C: Clock + Send + Sync,
{
    /// Creates a new cascade engine.
    #[must_use]
    pub const fn new(tasks: Arc<T>, flows: Arc<F>, sink: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            flows,
            sink,
            clock,
        }
    }

    /// Creates and stores a new empty flow.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::FlowRepository`] when persistence fails.
    pub async fn create_flow(&self) -> CascadeResult<Flow> {
        let flow = Flow::new(&*self.clock);
        self.flows.store(&flow).await?;
        Ok(flow)
    }

    /// Creates a task from a draft, evaluating dependency state once.
    ///
    /// A draft carrying any dependency reference starts blocked; a
    /// milestone reference must name a milestone task when the target
    /// exists (a dangling reference is tolerated, fail-open), and the
    /// precedent chain behind a task reference must stay within the
    /// bounded-walk depth limit. Emits `assigned` when the draft names
    /// an assignee, then propagates the hierarchy one level up.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::NotAMilestone`] for a non-milestone
    /// target, [`CascadeError::DependencyTooDeep`] for an overlong
    /// precedent chain, or a repository error when persistence fails.
    pub async fn create_task(&self, draft: TaskDraft, actor: UserId) -> CascadeResult<Task> {
        self.assert_milestone_target(draft.depends_on_milestone_id())
            .await?;

        let task = Task::new(draft, &*self.clock);
        if let Some(first) = task.depends_on_task_id() {
            self.assert_acyclic(task.id(), first).await?;
        }
        self.tasks.store(&task).await?;
        debug!(task = %task.id(), blocked = task.is_blocked(), "task created");

        if task.assignee_id().is_some() {
            self.emit(NotificationKind::Assigned, &task, actor).await;
        }
        self.propagate_hierarchy(&task).await;
        Ok(task)
    }

    /// Applies a caller-prepared task change: the single entry point for
    /// task mutation.
    ///
    /// Pre-save, the dependency resolver re-evaluates the blocked flag
    /// when a dependency reference changed, and the aggregate progress
    /// supersedes the status-table progress when the task has children.
    /// The write is conditional on `previous`'s concurrency token.
    /// Post-save, completion and reopen edges walk the dependents, flips
    /// and reassignments are notified, and the hierarchy is propagated
    /// one level up; every post-save step is best-effort per record.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::MismatchedChange`] when the pair describes
    /// two tasks, [`CascadeError::DependencyCycle`] /
    /// [`CascadeError::DependencyTooDeep`] / [`CascadeError::NotAMilestone`]
    /// for rejected dependency references, and a repository error
    /// (including a version conflict) when persisting the triggering
    /// record itself fails.
    pub async fn apply_change(
        &self,
        previous: &Task,
        next: Task,
        actor: UserId,
    ) -> CascadeResult<Task> {
        if previous.id() != next.id() {
            return Err(CascadeError::MismatchedChange {
                previous: previous.id(),
                next: next.id(),
            });
        }

        let prepared = self.presave_recompute(previous, next).await?;
        let stored = self.tasks.update(&prepared).await?;

        self.notify_edges(previous, &stored, actor).await;
        self.propagate_hierarchy(&stored).await;
        Ok(stored)
    }

    /// Re-runs the dependency resolver against the live store and
    /// repairs the cached blocked flag. Idempotent; safe to call from a
    /// periodic consistency sweep.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::TaskNotFound`] for an unknown task, or a
    /// repository error when the repair write fails.
    pub async fn recompute_blocked(&self, task_id: TaskId, actor: UserId) -> CascadeResult<bool> {
        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(CascadeError::TaskNotFound(task_id))?;

        let snapshot = self.resolve_snapshot(&task).await?;
        let blocked = dependency::should_be_blocked(&snapshot);
        if blocked == task.is_blocked() {
            return Ok(blocked);
        }

        let mut repaired = task.clone();
        repaired.set_blocked(blocked, &*self.clock);
        let stored = self.tasks.update(&repaired).await?;
        let kind = if blocked {
            NotificationKind::Blocked
        } else {
            NotificationKind::Unblocked
        };
        self.emit(kind, &stored, actor).await;
        Ok(blocked)
    }

    /// Recomputes the hierarchy aggregates (parent, then flow) above one
    /// task. Idempotent repair operation.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::TaskNotFound`] for an unknown task.
    pub async fn recompute_hierarchy(&self, task_id: TaskId) -> CascadeResult<()> {
        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(CascadeError::TaskNotFound(task_id))?;
        self.propagate_hierarchy(&task).await;
        Ok(())
    }

    /// Soft-deletes a flow and all of its tasks. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::FlowNotFound`] for an unknown flow, or a
    /// repository error when persisting the flow itself fails; task
    /// deletions are best-effort per record.
    pub async fn delete_flow(&self, flow_id: FlowId) -> CascadeResult<Flow> {
        let mut flow = self
            .flows
            .find_by_id(flow_id)
            .await?
            .ok_or(CascadeError::FlowNotFound(flow_id))?;
        if flow.is_deleted() {
            return Ok(flow);
        }

        flow.mark_deleted(&*self.clock);
        let stored = self.flows.update(&flow).await?;

        for task in self.tasks.find_by_flow(flow_id).await? {
            if task.is_deleted() {
                continue;
            }
            let mut doomed = task;
            doomed.mark_deleted(&*self.clock);
            if let Err(err) = self.tasks.update(&doomed).await {
                warn!(task = %doomed.id(), error = %err, "abandoning soft delete of flow task");
            }
        }
        Ok(stored)
    }

    /// Restores a soft-deleted flow and the tasks removed with it (tasks
    /// deleted before the flow stay deleted). Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::FlowNotFound`] for an unknown flow, or a
    /// repository error when persisting the flow itself fails; task
    /// restores are best-effort per record.
    pub async fn restore_flow(&self, flow_id: FlowId) -> CascadeResult<Flow> {
        let mut flow = self
            .flows
            .find_by_id(flow_id)
            .await?
            .ok_or(CascadeError::FlowNotFound(flow_id))?;
        let Some(flow_deleted_at) = flow.deleted_at() else {
            return Ok(flow);
        };

        flow.restore(&*self.clock);
        let stored = self.flows.update(&flow).await?;

        for task in self.tasks.find_by_flow(flow_id).await? {
            let removed_with_flow = task
                .deleted_at()
                .is_some_and(|deleted_at| deleted_at >= flow_deleted_at);
            if !removed_with_flow {
                continue;
            }
            let mut revived = task;
            revived.restore(&*self.clock);
            if let Err(err) = self.tasks.update(&revived).await {
                warn!(task = %revived.id(), error = %err, "abandoning restore of flow task");
            }
        }
        Ok(stored)
    }

    /// Pre-save recompute: dependency references, then aggregate
    /// progress for tasks with children.
    async fn presave_recompute(&self, previous: &Task, mut next: Task) -> CascadeResult<Task> {
        let refs_changed = previous.depends_on_task_id() != next.depends_on_task_id()
            || previous.depends_on_milestone_id() != next.depends_on_milestone_id();
        if refs_changed {
            self.assert_milestone_target(next.depends_on_milestone_id())
                .await?;
            if let Some(first) = next.depends_on_task_id() {
                self.assert_acyclic(next.id(), first).await?;
            }
            let snapshot = self.resolve_snapshot(&next).await?;
            let blocked = dependency::should_be_blocked(&snapshot);
            if blocked != next.is_blocked() {
                next.set_blocked(blocked, &*self.clock);
            }
        }

        let children = self.tasks.find_children(next.id()).await?;
        if !children.is_empty() {
            let aggregate = progress::mean(children.iter().map(Task::progress));
            next.apply_aggregate(aggregate, &*self.clock);
        }
        Ok(next)
    }

    /// Post-save reactions to the (old status, new status) edge and to
    /// field flips on the triggering record.
    async fn notify_edges(&self, previous: &Task, stored: &Task, actor: UserId) {
        let was_completed = matches!(previous.status(), TaskStatus::Completed);
        let is_completed = matches!(stored.status(), TaskStatus::Completed);
        if !was_completed && is_completed {
            self.on_completed(stored, actor).await;
        } else if was_completed && !is_completed {
            self.on_reopened(stored, actor).await;
        }

        if previous.is_blocked() != stored.is_blocked() {
            let kind = if stored.is_blocked() {
                NotificationKind::Blocked
            } else {
                NotificationKind::Unblocked
            };
            self.emit(kind, stored, actor).await;
        }

        if stored.assignee_id().is_some() && previous.assignee_id() != stored.assignee_id() {
            self.emit(NotificationKind::Assigned, stored, actor).await;
        }
    }

    /// Unlock pass: a completed task revisits its blocked dependents.
    async fn on_completed(&self, trigger: &Task, actor: UserId) {
        for dependent in self.collect_dependents(trigger).await {
            if !dependent.is_blocked() {
                continue;
            }
            self.try_unlock(dependent, actor).await;
        }

        self.emit(NotificationKind::Completed, trigger, actor).await;
        if trigger.is_milestone() {
            self.emit(NotificationKind::MilestoneCompleted, trigger, actor)
                .await;
        }
    }

    /// Re-runs the resolver for one blocked dependent and unblocks it
    /// when every reference is satisfied. A subtask is auto-started from
    /// `pending` on unblock.
    async fn try_unlock(&self, dependent: Task, actor: UserId) {
        let snapshot = match self.resolve_snapshot(&dependent).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(task = %dependent.id(), error = %err, "abandoning unlock of dependent");
                return;
            }
        };
        if dependency::should_be_blocked(&snapshot) {
            return;
        }

        let mut unblocked = dependent;
        unblocked.set_blocked(false, &*self.clock);
        if unblocked.parent_task_id().is_some()
            && matches!(unblocked.status(), TaskStatus::Pending)
        {
            if let Err(err) = unblocked.change_status(TaskStatus::InProgress, &*self.clock) {
                warn!(task = %unblocked.id(), error = %err, "auto-start of unblocked subtask rejected");
            }
        }

        match self.tasks.update(&unblocked).await {
            Ok(stored) => {
                debug!(task = %stored.id(), "dependent unblocked");
                self.emit(NotificationKind::Unblocked, &stored, actor).await;
            }
            Err(err) => {
                warn!(task = %unblocked.id(), error = %err, "abandoning unlock of dependent");
            }
        }
    }

    /// Fail-closed re-lock pass: reopening a completed task re-blocks
    /// every direct dependent without re-checking their other
    /// references.
    async fn on_reopened(&self, trigger: &Task, actor: UserId) {
        for dependent in self.collect_dependents(trigger).await {
            if dependent.is_blocked() {
                continue;
            }
            let mut blocked = dependent;
            blocked.set_blocked(true, &*self.clock);
            match self.tasks.update(&blocked).await {
                Ok(stored) => {
                    debug!(task = %stored.id(), "dependent re-blocked");
                    self.emit(NotificationKind::Blocked, &stored, actor).await;
                }
                Err(err) => {
                    warn!(task = %blocked.id(), error = %err, "abandoning re-block of dependent");
                }
            }
        }
    }

    /// Collects direct dependents via the precedent edge and, for a
    /// milestone, the milestone edge; each dependent is visited once.
    async fn collect_dependents(&self, trigger: &Task) -> Vec<Task> {
        let mut dependents = match self.tasks.find_dependents_on_task(trigger.id()).await {
            Ok(found) => found,
            Err(err) => {
                warn!(task = %trigger.id(), error = %err, "abandoning dependent walk");
                Vec::new()
            }
        };
        if trigger.is_milestone() {
            match self.tasks.find_dependents_on_milestone(trigger.id()).await {
                Ok(found) => dependents.extend(found),
                Err(err) => {
                    warn!(task = %trigger.id(), error = %err, "abandoning milestone dependent walk");
                }
            }
        }

        let mut seen = HashSet::new();
        dependents.retain(|task| seen.insert(task.id()));
        dependents
    }

    /// Quiet hierarchy propagation: parent aggregate, then flow
    /// aggregate, one level per trigger. Failures are logged per record
    /// and never surfaced.
    async fn propagate_hierarchy(&self, task: &Task) {
        if let Some(parent_id) = task.parent_task_id() {
            self.refresh_parent(parent_id).await;
        }
        if let Some(flow_id) = task.flow_id() {
            self.refresh_flow(flow_id).await;
        }
    }

    /// Recomputes one parent's aggregate progress and derived status.
    async fn refresh_parent(&self, parent_id: TaskId) {
        let parent = match self.tasks.find_by_id(parent_id).await {
            Ok(Some(parent)) => parent,
            Ok(None) => {
                warn!(parent = %parent_id, "dangling hierarchy parent; skipping aggregation");
                return;
            }
            Err(err) => {
                warn!(parent = %parent_id, error = %err, "abandoning parent aggregation");
                return;
            }
        };

        let children = match self.tasks.find_children(parent_id).await {
            Ok(children) => children,
            Err(err) => {
                warn!(parent = %parent_id, error = %err, "abandoning parent aggregation");
                return;
            }
        };

        let mut refreshed = parent;
        let aggregate = progress::mean(children.iter().map(Task::progress));
        refreshed.apply_aggregate(aggregate, &*self.clock);
        match self.tasks.update(&refreshed).await {
            Ok(stored) => {
                debug!(parent = %stored.id(), progress = %aggregate, "parent aggregate refreshed");
            }
            Err(err) => {
                warn!(parent = %refreshed.id(), error = %err, "abandoning parent aggregation");
            }
        }
    }

    /// Recomputes one flow's aggregate progress from its root tasks.
    async fn refresh_flow(&self, flow_id: FlowId) {
        let flow = match self.flows.find_by_id(flow_id).await {
            Ok(Some(flow)) => flow,
            Ok(None) => {
                warn!(flow = %flow_id, "dangling flow reference; skipping aggregation");
                return;
            }
            Err(err) => {
                warn!(flow = %flow_id, error = %err, "abandoning flow aggregation");
                return;
            }
        };

        let roots = match self.tasks.find_flow_roots(flow_id).await {
            Ok(roots) => roots,
            Err(err) => {
                warn!(flow = %flow_id, error = %err, "abandoning flow aggregation");
                return;
            }
        };

        let mut refreshed = flow;
        let aggregate = progress::mean(roots.iter().map(Task::progress));
        refreshed.apply_aggregate(aggregate, &*self.clock);
        match self.flows.update(&refreshed).await {
            Ok(stored) => {
                debug!(flow = %stored.id(), progress = %aggregate, "flow aggregate refreshed");
            }
            Err(err) => {
                warn!(flow = %refreshed.id(), error = %err, "abandoning flow aggregation");
            }
        }
    }

    /// Resolves both dependency references against the live store.
    async fn resolve_snapshot(&self, task: &Task) -> CascadeResult<DependencySnapshot> {
        Ok(DependencySnapshot {
            task: self.resolve_target(task.depends_on_task_id()).await?,
            milestone: self.resolve_target(task.depends_on_milestone_id()).await?,
        })
    }

    /// Resolves one dependency reference to the target's current status.
    async fn resolve_target(&self, reference: Option<TaskId>) -> CascadeResult<DependencyTarget> {
        let Some(id) = reference else {
            return Ok(DependencyTarget::Absent);
        };
        match self.tasks.find_by_id(id).await? {
            Some(target) => Ok(DependencyTarget::Found(target.status())),
            None => {
                warn!(target = %id, "dangling dependency reference; treating as satisfied");
                Ok(DependencyTarget::Missing)
            }
        }
    }

    /// Rejects a `depends_on_milestone_id` reference naming a task that
    /// exists but is not a milestone. A dangling reference passes.
    async fn assert_milestone_target(&self, reference: Option<TaskId>) -> CascadeResult<()> {
        let Some(id) = reference else {
            return Ok(());
        };
        match self.tasks.find_by_id(id).await? {
            Some(target) if !target.is_milestone() => Err(CascadeError::NotAMilestone(id)),
            Some(_) => Ok(()),
            None => {
                warn!(target = %id, "dangling milestone reference accepted");
                Ok(())
            }
        }
    }

    /// Bounded walk along `depends_on_task_id` edges rejecting a chain
    /// that leads back to `origin` or exceeds the depth limit.
    async fn assert_acyclic(&self, origin: TaskId, first: TaskId) -> CascadeResult<()> {
        let mut current = first;
        for _ in 0..MAX_DEPENDENCY_DEPTH {
            if current == origin {
                return Err(CascadeError::DependencyCycle { task_id: origin });
            }
            let Some(task) = self.tasks.find_by_id(current).await? else {
                return Ok(());
            };
            let Some(next) = task.depends_on_task_id() else {
                return Ok(());
            };
            current = next;
        }
        Err(CascadeError::DependencyTooDeep {
            task_id: origin,
            limit: MAX_DEPENDENCY_DEPTH,
        })
    }

    /// Delivers one notification, swallowing delivery failures.
    async fn emit(&self, kind: NotificationKind, task: &Task, actor: UserId) {
        let notification = Notification {
            kind,
            task_id: task.id(),
            flow_id: task.flow_id(),
            assignee_id: task.assignee_id(),
            actor_id: actor,
            extra: None,
        };
        if let Err(err) = self.sink.notify(notification).await {
            warn!(task = %task.id(), ?kind, error = %err, "notification delivery failed");
        }
    }
}
