//! Unit tests for the progress policy.

use crate::workflow::domain::{Progress, TaskDomainError, TaskStatus, progress};
use rstest::rstest;

fn pct(value: u8) -> Progress {
    Progress::new(value).expect("test value within range")
}

#[rstest]
fn progress_rejects_values_above_one_hundred() {
    assert_eq!(
        Progress::new(101),
        Err(TaskDomainError::InvalidProgress(101))
    );
}

#[rstest]
#[case(TaskStatus::Pending, 70, 0)]
#[case(TaskStatus::Cancelled, 70, 0)]
#[case(TaskStatus::Completed, 70, 100)]
#[case(TaskStatus::InProgress, 0, 50)]
#[case(TaskStatus::InProgress, 70, 70)]
fn for_status_maps_to_canonical_value(
    #[case] status: TaskStatus,
    #[case] current: u8,
    #[case] expected: u8,
) {
    assert_eq!(progress::for_status(status, pct(current)), pct(expected));
}

#[rstest]
#[case(&[], 0)]
#[case(&[0, 50, 100], 50)]
#[case(&[100, 100], 100)]
#[case(&[0, 0, 100], 33)]
#[case(&[0, 100, 100], 67)]
#[case(&[25], 25)]
fn mean_rounds_half_up(#[case] values: &[u8], #[case] expected: u8) {
    let aggregate = progress::mean(values.iter().copied().map(pct));
    assert_eq!(aggregate, pct(expected));
}

#[rstest]
#[case(100, TaskStatus::InProgress, Some(TaskStatus::Completed))]
#[case(100, TaskStatus::Pending, Some(TaskStatus::Completed))]
#[case(100, TaskStatus::Completed, None)]
#[case(50, TaskStatus::Pending, Some(TaskStatus::InProgress))]
#[case(50, TaskStatus::InProgress, None)]
#[case(0, TaskStatus::Completed, Some(TaskStatus::Pending))]
#[case(0, TaskStatus::InProgress, Some(TaskStatus::Pending))]
#[case(0, TaskStatus::Pending, None)]
fn derived_status_follows_aggregate(
    #[case] aggregate: u8,
    #[case] current: TaskStatus,
    #[case] expected: Option<TaskStatus>,
) {
    assert_eq!(progress::derived_status(pct(aggregate), current), expected);
}

#[rstest]
#[case(0)]
#[case(50)]
#[case(100)]
fn derived_status_never_leaves_cancelled(#[case] aggregate: u8) {
    assert_eq!(
        progress::derived_status(pct(aggregate), TaskStatus::Cancelled),
        None
    );
}
