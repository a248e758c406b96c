//! Flow aggregate: a container of root-level tasks with derived progress.

use super::{FlowId, FlowStatus, Progress};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Flow aggregate root.
///
/// Status and progress are derived from the flow's root tasks by the
/// cascade service; `started_at` and `completed_at` are set once and
/// never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    id: FlowId,
    status: FlowStatus,
    progress: Progress,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    version: u64,
}

/// Parameter object for reconstructing a persisted flow aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedFlowData {
    /// Persisted flow identifier.
    pub id: FlowId,
    /// Persisted lifecycle status.
    pub status: FlowStatus,
    /// Persisted aggregate progress.
    pub progress: Progress,
    /// Persisted first-progress timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Persisted first-completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Persisted concurrency token.
    pub version: u64,
}

impl Flow {
    /// Creates a new empty pending flow.
    #[must_use]
    pub fn new(clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: FlowId::new(),
            status: FlowStatus::Pending,
            progress: Progress::ZERO,
            started_at: None,
            completed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
            version: 0,
        }
    }

    /// Reconstructs a flow from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedFlowData) -> Self {
        Self {
            id: data.id,
            status: data.status,
            progress: data.progress,
            started_at: data.started_at,
            completed_at: data.completed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
            version: data.version,
        }
    }

    /// Returns the flow identifier.
    #[must_use]
    pub const fn id(&self) -> FlowId {
        self.id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> FlowStatus {
        self.status
    }

    /// Returns the aggregate progress.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Returns the first-progress timestamp, if set.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns the first-completion timestamp, if set.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
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

    /// Returns whether the flow is soft-deleted.
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

    /// Applies an aggregate progress computed from root tasks.
    ///
    /// Reaching 100 completes the flow and stamps `completed_at` exactly
    /// once (first completion wins). Any progress above zero moves a
    /// pending flow to `in_progress` and stamps `started_at` once.
    /// Regressions below 100 leave status and timestamps untouched.
    pub fn apply_aggregate(&mut self, aggregate: Progress, clock: &impl Clock) {
        self.progress = aggregate;
        if aggregate.is_complete() {
            self.status = FlowStatus::Completed;
            if self.completed_at.is_none() {
                self.completed_at = Some(clock.utc());
            }
        } else if !aggregate.is_zero() && matches!(self.status, FlowStatus::Pending) {
            self.status = FlowStatus::InProgress;
            if self.started_at.is_none() {
                self.started_at = Some(clock.utc());
            }
        }
        self.touch(clock);
    }

    /// Soft-deletes the flow. Idempotent.
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
