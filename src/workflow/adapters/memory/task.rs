//! In-memory task repository for tests and embedding.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{FlowId, Task, TaskId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Relationship lookups are linear scans; the store exists for tests and
/// small embedded deployments, not for scale.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<std::sync::RwLockReadGuard<'_, HashMap<TaskId, Task>>> {
        self.tasks.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(
        &self,
    ) -> TaskRepositoryResult<std::sync::RwLockWriteGuard<'_, HashMap<TaskId, Task>>> {
        self.tasks.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn collect_live<P>(&self, predicate: P) -> TaskRepositoryResult<Vec<Task>>
    where
        P: Fn(&Task) -> bool,
    {
        let tasks = self.read()?;
        Ok(tasks
            .values()
            .filter(|task| !task.is_deleted() && predicate(task))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.write()?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<Task> {
        let mut tasks = self.write()?;
        let stored = tasks
            .get(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        if stored.version() != task.version() {
            return Err(TaskRepositoryError::VersionConflict {
                id: task.id(),
                held: task.version(),
                stored: stored.version(),
            });
        }
        let updated = task.clone().with_bumped_version();
        tasks.insert(task.id(), updated.clone());
        Ok(updated)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.read()?;
        Ok(tasks.get(&id).filter(|task| !task.is_deleted()).cloned())
    }

    async fn find_dependents_on_task(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.collect_live(|task| task.depends_on_task_id() == Some(id))
    }

    async fn find_dependents_on_milestone(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.collect_live(|task| task.depends_on_milestone_id() == Some(id))
    }

    async fn find_children(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.collect_live(|task| task.parent_task_id() == Some(parent_id))
    }

    async fn find_flow_roots(&self, flow_id: FlowId) -> TaskRepositoryResult<Vec<Task>> {
        self.collect_live(|task| task.flow_id() == Some(flow_id) && task.parent_task_id().is_none())
    }

    async fn find_by_flow(&self, flow_id: FlowId) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.read()?;
        Ok(tasks
            .values()
            .filter(|task| task.flow_id() == Some(flow_id))
            .cloned()
            .collect())
    }
}
