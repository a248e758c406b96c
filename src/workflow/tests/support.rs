//! Shared harness for cascade and hierarchy orchestration tests.

use std::sync::Arc;

use mockable::DefaultClock;

use crate::workflow::{
    adapters::memory::{InMemoryFlowRepository, InMemoryTaskRepository, RecordingSink},
    domain::{Flow, Task, TaskId, TaskStatus, UserId},
    ports::{FlowRepository, NotificationKind, TaskRepository},
    services::CascadeEngine,
};

pub(super) type TestEngine =
    CascadeEngine<InMemoryTaskRepository, InMemoryFlowRepository, RecordingSink, DefaultClock>;

/// Engine wired to in-memory collaborators, plus direct handles to them.
pub(super) struct Harness {
    pub engine: TestEngine,
    pub tasks: Arc<InMemoryTaskRepository>,
    pub flows: Arc<InMemoryFlowRepository>,
    pub sink: Arc<RecordingSink>,
    pub clock: DefaultClock,
    pub actor: UserId,
}

impl Harness {
    pub fn new() -> Self {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let flows = Arc::new(InMemoryFlowRepository::new());
        let sink = Arc::new(RecordingSink::new());
        let engine = CascadeEngine::new(
            Arc::clone(&tasks),
            Arc::clone(&flows),
            Arc::clone(&sink),
            Arc::new(DefaultClock),
        );
        Self {
            engine,
            tasks,
            flows,
            sink,
            clock: DefaultClock,
            actor: UserId::new(),
        }
    }

    /// Reloads a task from the store.
    pub async fn task(&self, id: TaskId) -> Task {
        self.tasks
            .find_by_id(id)
            .await
            .expect("lookup succeeds")
            .expect("task exists")
    }

    /// Reloads a flow from the store.
    pub async fn flow(&self, flow: &Flow) -> Flow {
        self.flows
            .find_by_id(flow.id())
            .await
            .expect("lookup succeeds")
            .expect("flow exists")
    }

    /// Drives one status change through the engine's entry point.
    pub async fn set_status(&self, id: TaskId, status: TaskStatus) -> Task {
        let previous = self.task(id).await;
        let mut next = previous.clone();
        next.change_status(status, &self.clock)
            .expect("transition permitted by the state machine");
        self.engine
            .apply_change(&previous, next, self.actor)
            .await
            .expect("change applies cleanly")
    }

    /// Returns the kinds delivered for one task, in delivery order.
    pub fn kinds_for(&self, id: TaskId) -> Vec<NotificationKind> {
        self.sink
            .delivered()
            .expect("sink log readable")
            .into_iter()
            .filter(|notification| notification.task_id == id)
            .map(|notification| notification.kind)
            .collect()
    }
}
