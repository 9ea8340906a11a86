//! Service layer enforcing owner scoping and not-found signaling.

use crate::task::{
    domain::{NewTask, Task, TaskDomainError, TaskFilter, TaskId, TaskKey, TaskStatus, User},
    ports::{TaskRepository, TaskRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
}

impl CreateTaskRequest {
    /// Creates a request from raw title and description text.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// No task with this identifier belongs to the requesting user.
    #[error("task with id {0} not found")]
    NotFound(TaskId),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task orchestration service.
///
/// Every operation runs on behalf of an already authenticated [`User`] and
/// only ever touches that user's tasks. A task owned by someone else is
/// reported exactly like a missing one.
#[derive(Clone)]
pub struct TaskService<R>
where
    R: TaskRepository,
{
    repository: Arc<R>,
}

impl<R> TaskService<R>
where
    R: TaskRepository,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Lists the user's tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Repository`] when the lookup fails.
    #[tracing::instrument(skip_all, fields(user_id = %user.id()))]
    pub async fn get_tasks(&self, filter: &TaskFilter, user: &User) -> TaskServiceResult<Vec<Task>> {
        let tasks = self.repository.list_tasks(filter, user.id()).await?;
        debug!(count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    /// Retrieves one of the user's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the user owns no task with
    /// this identifier, or [`TaskServiceError::Repository`] when the lookup
    /// fails.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id()))]
    pub async fn get_task_by_id(&self, id: TaskId, user: &User) -> TaskServiceResult<Task> {
        let found = self.repository.find_one(TaskKey::new(id, user.id())).await?;
        found.ok_or_else(|| {
            debug!("task not found for user");
            TaskServiceError::NotFound(id)
        })
    }

    /// Creates a task owned by the user in the `OPEN` status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] when the title or description is
    /// blank, or [`TaskServiceError::Repository`] when persistence fails.
    #[tracing::instrument(skip_all, fields(user_id = %user.id()))]
    pub async fn create_task(
        &self,
        request: CreateTaskRequest,
        user: &User,
    ) -> TaskServiceResult<Task> {
        let data = NewTask::new(request.title, request.description)?;
        let task = self.repository.create_task(&data, user.id()).await?;
        info!(task_id = %task.id(), "task created");
        Ok(task)
    }

    /// Deletes one of the user's tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when nothing was deleted, or
    /// [`TaskServiceError::Repository`] when the delete fails.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id()))]
    pub async fn delete_task_by_id(&self, id: TaskId, user: &User) -> TaskServiceResult<()> {
        let affected = self.repository.delete(TaskKey::new(id, user.id())).await?;
        if affected == 0 {
            debug!("no task deleted");
            return Err(TaskServiceError::NotFound(id));
        }
        info!("task deleted");
        Ok(())
    }

    /// Sets the status of one of the user's tasks and returns the updated
    /// task.
    ///
    /// Any status may follow any other. The fetch and the write are separate
    /// store calls; a task removed in between is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the user owns no task with
    /// this identifier, or [`TaskServiceError::Repository`] when the lookup
    /// or write fails.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id()))]
    pub async fn update_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        user: &User,
    ) -> TaskServiceResult<Task> {
        let mut task = self.get_task_by_id(id, user).await?;
        task.set_status(status);
        self.repository.update(&task).await.map_err(|err| match err {
            TaskRepositoryError::NotFound(missing) => TaskServiceError::NotFound(missing),
            other => TaskServiceError::Repository(other),
        })?;
        info!("task status updated");
        Ok(task)
    }
}
