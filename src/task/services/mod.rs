//! Application services for owner-scoped task management.

mod tasks;

pub use tasks::{CreateTaskRequest, TaskService, TaskServiceError, TaskServiceResult};
