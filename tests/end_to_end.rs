//! Black-box scenario: one flow, two root tasks, one dependency edge.
//!
//! Flow F owns root tasks A and B; B depends on A. Completing A must
//! unblock B without auto-starting it (B is a root, not a subtask),
//! roll the flow up to 50% in-progress, and stamp `started_at`.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::{fixture, rstest};

use taskflow::workflow::{
    adapters::memory::{InMemoryFlowRepository, InMemoryTaskRepository, RecordingSink},
    domain::{FlowStatus, Progress, TaskDraft, TaskStatus, UserId},
    ports::{FlowRepository, NotificationKind, TaskRepository},
    services::CascadeEngine,
};

type Engine =
    CascadeEngine<InMemoryTaskRepository, InMemoryFlowRepository, RecordingSink, DefaultClock>;

struct World {
    engine: Engine,
    tasks: Arc<InMemoryTaskRepository>,
    flows: Arc<InMemoryFlowRepository>,
    sink: Arc<RecordingSink>,
}

#[fixture]
fn world() -> World {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let flows = Arc::new(InMemoryFlowRepository::new());
    let sink = Arc::new(RecordingSink::new());
    let engine = CascadeEngine::new(
        Arc::clone(&tasks),
        Arc::clone(&flows),
        Arc::clone(&sink),
        Arc::new(DefaultClock),
    );
    World {
        engine,
        tasks,
        flows,
        sink,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completing_the_first_root_unblocks_and_rolls_up(world: World) {
    let actor = UserId::new();
    let clock = DefaultClock;

    let flow = world.engine.create_flow().await.expect("flow created");
    let task_a = world
        .engine
        .create_task(TaskDraft::new().in_flow(flow.id()), actor)
        .await
        .expect("A created");
    let task_b = world
        .engine
        .create_task(
            TaskDraft::new().in_flow(flow.id()).depending_on_task(task_a.id()),
            actor,
        )
        .await
        .expect("B created");

    assert!(!task_a.is_blocked());
    assert!(task_b.is_blocked());

    let mut completed = task_a.clone();
    completed
        .change_status(TaskStatus::Completed, &clock)
        .expect("pending -> completed permitted");
    let stored_a = world
        .engine
        .apply_change(&task_a, completed, actor)
        .await
        .expect("change applies");

    assert_eq!(stored_a.status(), TaskStatus::Completed);
    assert_eq!(stored_a.progress(), Progress::COMPLETE);
    assert!(!stored_a.is_blocked());

    let stored_b = world
        .tasks
        .find_by_id(task_b.id())
        .await
        .expect("lookup succeeds")
        .expect("B exists");
    assert!(!stored_b.is_blocked());
    // B is a root task: unblocking never auto-starts it.
    assert_eq!(stored_b.status(), TaskStatus::Pending);
    assert_eq!(stored_b.progress(), Progress::ZERO);

    let stored_flow = world
        .flows
        .find_by_id(flow.id())
        .await
        .expect("lookup succeeds")
        .expect("flow exists");
    assert_eq!(stored_flow.progress(), Progress::HALF);
    assert_eq!(stored_flow.status(), FlowStatus::InProgress);
    assert!(stored_flow.started_at().is_some());
    assert!(stored_flow.completed_at().is_none());

    let delivered = world.sink.delivered().expect("sink log readable");
    let kinds: Vec<(NotificationKind, _)> = delivered
        .iter()
        .map(|notification| (notification.kind, notification.task_id))
        .collect();
    assert!(kinds.contains(&(NotificationKind::Unblocked, task_b.id())));
    assert!(kinds.contains(&(NotificationKind::Completed, task_a.id())));
}
