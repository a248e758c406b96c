//! Progress values and the pure progress policy.
//!
//! The policy maps a leaf task's status to a canonical progress value and
//! derives a parent's status from its children's aggregate progress. Both
//! directions are pure; the cascade service decides when to apply them.

use super::{TaskDomainError, TaskStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion percentage clamped to 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    /// No progress.
    pub const ZERO: Self = Self(0);
    /// The canonical "work has started" value.
    pub const HALF: Self = Self(50);
    /// Full completion.
    pub const COMPLETE: Self = Self(100);

    /// Creates a validated progress value.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidProgress`] when `value` exceeds
    /// 100.
    pub const fn new(value: u8) -> Result<Self, TaskDomainError> {
        if value > 100 {
            return Err(TaskDomainError::InvalidProgress(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying percentage.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Returns whether no progress has been made.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns whether progress has reached 100.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.0 == 100
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Maps a status to its canonical progress for a task without children.
///
/// `in_progress` keeps any manual progress already above zero; the other
/// statuses overwrite unconditionally.
#[must_use]
pub const fn for_status(status: TaskStatus, current: Progress) -> Progress {
    match status {
        TaskStatus::Pending | TaskStatus::Cancelled => Progress::ZERO,
        TaskStatus::InProgress => {
            if current.is_zero() {
                Progress::HALF
            } else {
                current
            }
        }
        TaskStatus::Completed => Progress::COMPLETE,
    }
}

/// Arithmetic mean of progress values, rounded half-up. Zero for an
/// empty set.
#[expect(
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "rounded integer mean; the +half adjustment makes truncation exact"
)]
#[expect(
    clippy::cast_possible_truncation,
    reason = "the mean of values in 0..=100 fits in u8"
)]
#[must_use]
pub fn mean<I>(values: I) -> Progress
where
    I: IntoIterator<Item = Progress>,
{
    let mut sum: u32 = 0;
    let mut count: u32 = 0;
    for value in values {
        sum += u32::from(value.value());
        count += 1;
    }
    if count == 0 {
        return Progress::ZERO;
    }
    Progress(((sum * 2 + count) / (count * 2)) as u8)
}

/// Derives the status a parent task should move to from its aggregate
/// progress, or `None` when the current status already fits.
///
/// Never suggests leaving `cancelled`.
#[must_use]
pub const fn derived_status(aggregate: Progress, current: TaskStatus) -> Option<TaskStatus> {
    if current.is_terminal() {
        return None;
    }
    if aggregate.is_complete() {
        return match current {
            TaskStatus::Completed => None,
            _ => Some(TaskStatus::Completed),
        };
    }
    if aggregate.is_zero() {
        return match current {
            TaskStatus::Completed | TaskStatus::InProgress => Some(TaskStatus::Pending),
            _ => None,
        };
    }
    match current {
        TaskStatus::Pending => Some(TaskStatus::InProgress),
        _ => None,
    }
}
