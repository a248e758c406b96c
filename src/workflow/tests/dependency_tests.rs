//! Unit tests for the blocked-state resolver.

use crate::workflow::domain::{
    DependencySnapshot, DependencyTarget, TaskStatus, dependency::should_be_blocked,
};
use rstest::rstest;

const fn snapshot(task: DependencyTarget, milestone: DependencyTarget) -> DependencySnapshot {
    DependencySnapshot { task, milestone }
}

#[rstest]
fn no_references_means_unblocked() {
    assert!(!should_be_blocked(&DependencySnapshot::UNGATED));
}

#[rstest]
#[case(TaskStatus::Pending, true)]
#[case(TaskStatus::InProgress, true)]
#[case(TaskStatus::Cancelled, true)]
#[case(TaskStatus::Completed, false)]
fn precedent_task_gates_until_completed(#[case] status: TaskStatus, #[case] expected: bool) {
    let observed = snapshot(DependencyTarget::Found(status), DependencyTarget::Absent);
    assert_eq!(should_be_blocked(&observed), expected);
}

#[rstest]
#[case(TaskStatus::InProgress, true)]
#[case(TaskStatus::Completed, false)]
fn milestone_gates_until_completed(#[case] status: TaskStatus, #[case] expected: bool) {
    let observed = snapshot(DependencyTarget::Absent, DependencyTarget::Found(status));
    assert_eq!(should_be_blocked(&observed), expected);
}

#[rstest]
fn either_unmet_reference_blocks() {
    let observed = snapshot(
        DependencyTarget::Found(TaskStatus::Completed),
        DependencyTarget::Found(TaskStatus::Pending),
    );
    assert!(should_be_blocked(&observed));
}

#[rstest]
fn both_satisfied_references_unblock() {
    let observed = snapshot(
        DependencyTarget::Found(TaskStatus::Completed),
        DependencyTarget::Found(TaskStatus::Completed),
    );
    assert!(!should_be_blocked(&observed));
}

#[rstest]
fn dangling_reference_fails_open() {
    let observed = snapshot(DependencyTarget::Missing, DependencyTarget::Absent);
    assert!(!should_be_blocked(&observed));
}

#[rstest]
fn dangling_reference_does_not_mask_unmet_sibling() {
    let observed = snapshot(
        DependencyTarget::Missing,
        DependencyTarget::Found(TaskStatus::Pending),
    );
    assert!(should_be_blocked(&observed));
}
