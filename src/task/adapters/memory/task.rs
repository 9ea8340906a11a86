//! In-memory task repository for tests and embedders without a database.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{NewTask, Task, TaskFilter, TaskId, TaskKey, UserId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Identifiers are assigned from a monotonically increasing counter starting
/// at 1 and are never reused after deletion.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: BTreeMap<TaskId, Task>,
    last_id: i64,
}

impl InMemoryTaskState {
    fn owned(&self, key: TaskKey) -> Option<&Task> {
        self.tasks
            .get(&key.id)
            .filter(|task| task.owner_id() == key.owner_id)
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        owner_id: UserId,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .values()
            .filter(|task| task.owner_id() == owner_id && filter.matches(task))
            .cloned()
            .collect())
    }

    async fn find_one(&self, key: TaskKey) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.owned(key).cloned())
    }

    async fn create_task(&self, data: &NewTask, owner_id: UserId) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let next_id = state.last_id.checked_add(1).ok_or_else(|| {
            TaskRepositoryError::persistence(std::io::Error::other("task id sequence exhausted"))
        })?;
        state.last_id = next_id;

        let task = Task::created(TaskId::new(next_id), data, owner_id);
        state.tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn delete(&self, key: TaskKey) -> TaskRepositoryResult<u64> {
        let mut state = self.write()?;
        if state.owned(key).is_none() {
            return Ok(0);
        }
        state.tasks.remove(&key.id);
        Ok(1)
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.owned(task.key()).is_none() {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }
}
