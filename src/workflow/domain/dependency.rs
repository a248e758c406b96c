//! Pure blocked-state resolution over a task's dependency references.
//!
//! A task carries up to two dependency references: a precedent task and a
//! milestone. The resolver answers one question from a snapshot of the
//! referenced tasks' statuses: should the task be blocked right now? The
//! answer is the OR of the unmet references; a dangling reference is
//! fail-open (never blocks), so a deleted precedent cannot freeze its
//! dependents forever.

use super::TaskStatus;

/// Observed state of one dependency reference at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyTarget {
    /// The task carries no reference of this kind.
    Absent,
    /// The reference is set but the target record could not be found.
    Missing,
    /// The target record was found with the given status.
    Found(TaskStatus),
}

impl DependencyTarget {
    /// Returns whether this reference currently gates the task.
    #[must_use]
    pub const fn is_unmet(self) -> bool {
        match self {
            Self::Absent | Self::Missing => false,
            Self::Found(status) => !matches!(status, TaskStatus::Completed),
        }
    }
}

/// Snapshot of both dependency references of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencySnapshot {
    /// State of the `depends_on_task_id` reference.
    pub task: DependencyTarget,
    /// State of the `depends_on_milestone_id` reference.
    pub milestone: DependencyTarget,
}

impl DependencySnapshot {
    /// Snapshot of a task with no dependency references at all.
    pub const UNGATED: Self = Self {
        task: DependencyTarget::Absent,
        milestone: DependencyTarget::Absent,
    };
}

/// Decides the blocked flag from a dependency snapshot.
///
/// True iff at least one reference resolves to a target that has not
/// completed. Missing targets are treated as satisfied.
#[must_use]
pub const fn should_be_blocked(snapshot: &DependencySnapshot) -> bool {
    snapshot.task.is_unmet() || snapshot.milestone.is_unmet()
}
