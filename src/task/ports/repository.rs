//! Repository port for owner-scoped task persistence.

use crate::task::domain::{NewTask, Task, TaskFilter, TaskId, TaskKey, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Every read and write is constrained to a single owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Returns the owner's tasks that satisfy `filter`, ordered by ascending
    /// task identifier.
    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        owner_id: UserId,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Finds a task by identifier, constrained to its owner.
    ///
    /// Returns `None` when no task matches both halves of the key.
    async fn find_one(&self, key: TaskKey) -> TaskRepositoryResult<Option<Task>>;

    /// Stores a new task in [`TaskStatus::Open`](crate::task::domain::TaskStatus::Open)
    /// and returns it with its assigned identifier.
    async fn create_task(&self, data: &NewTask, owner_id: UserId) -> TaskRepositoryResult<Task>;

    /// Removes the task matching the key and returns the number of rows
    /// removed (0 or 1).
    async fn delete(&self, key: TaskKey) -> TaskRepositoryResult<u64>;

    /// Persists the mutable fields of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when no task matches the
    /// task's owner-scoped key.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found for its owner.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
