//! Tests for the in-memory repository adapters.

use crate::workflow::{
    adapters::memory::{InMemoryFlowRepository, InMemoryTaskRepository},
    domain::{Flow, Task, TaskDraft, TaskId},
    ports::{FlowRepository, TaskRepository, TaskRepositoryError},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> DefaultClock {
    DefaultClock
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn store_rejects_duplicate_task(clock: DefaultClock) {
    let repo = InMemoryTaskRepository::new();
    let task = Task::new(TaskDraft::new(), &clock);

    repo.store(&task).await.expect("first store succeeds");
    let result = repo.store(&task).await;
    assert!(matches!(
        result,
        Err(TaskRepositoryError::DuplicateTask(id)) if id == task.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_bumps_version_and_rejects_stale_writers(clock: DefaultClock) {
    let repo = InMemoryTaskRepository::new();
    let task = Task::new(TaskDraft::new(), &clock);
    repo.store(&task).await.expect("store succeeds");

    let mut fresh = task.clone();
    fresh.assign(None, &clock);
    let stored = repo.update(&fresh).await.expect("first update succeeds");
    assert_eq!(stored.version(), task.version() + 1);

    // A writer still holding the original version loses.
    let result = repo.update(&task).await;
    assert!(matches!(
        result,
        Err(TaskRepositoryError::VersionConflict { held: 0, stored: 1, .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_rejects_unknown_task(clock: DefaultClock) {
    let repo = InMemoryTaskRepository::new();
    let task = Task::new(TaskDraft::new(), &clock);
    let result = repo.update(&task).await;
    assert!(matches!(result, Err(TaskRepositoryError::NotFound(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookups_exclude_soft_deleted_tasks(clock: DefaultClock) {
    let repo = InMemoryTaskRepository::new();
    let parent = Task::new(TaskDraft::new(), &clock);
    repo.store(&parent).await.expect("store succeeds");

    let mut child = Task::new(TaskDraft::new().under_parent(parent.id()), &clock);
    repo.store(&child).await.expect("store succeeds");
    child.mark_deleted(&clock);
    repo.update(&child).await.expect("update succeeds");

    assert!(
        repo.find_by_id(child.id())
            .await
            .expect("lookup succeeds")
            .is_none()
    );
    assert!(
        repo.find_children(parent.id())
            .await
            .expect("lookup succeeds")
            .is_empty()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dependent_lookups_match_reference_kind(clock: DefaultClock) {
    let repo = InMemoryTaskRepository::new();
    let target = TaskId::new();
    let by_task = Task::new(TaskDraft::new().depending_on_task(target), &clock);
    let by_milestone = Task::new(TaskDraft::new().depending_on_milestone(target), &clock);
    repo.store(&by_task).await.expect("store succeeds");
    repo.store(&by_milestone).await.expect("store succeeds");

    let on_task = repo
        .find_dependents_on_task(target)
        .await
        .expect("lookup succeeds");
    assert_eq!(on_task.len(), 1);
    assert_eq!(on_task.first().map(Task::id), Some(by_task.id()));

    let on_milestone = repo
        .find_dependents_on_milestone(target)
        .await
        .expect("lookup succeeds");
    assert_eq!(on_milestone.len(), 1);
    assert_eq!(on_milestone.first().map(Task::id), Some(by_milestone.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn flow_repository_applies_version_check(clock: DefaultClock) {
    let repo = InMemoryFlowRepository::new();
    let flow = Flow::new(&clock);
    repo.store(&flow).await.expect("store succeeds");

    let stored = repo.update(&flow).await.expect("update succeeds");
    assert_eq!(stored.version(), flow.version() + 1);

    let stale = repo.update(&flow).await;
    assert!(stale.is_err());
}
