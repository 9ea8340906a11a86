//! Domain model for per-user task tracking.
//!
//! The task domain models task records, their status, listing filters, and
//! the owner-scoped keys used to address them, keeping all infrastructure
//! concerns outside of the domain boundary.

mod error;
mod filter;
mod ids;
mod task;
mod user;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use filter::TaskFilter;
pub use ids::{TaskId, TaskKey, UserId};
pub use task::{NewTask, PersistedTaskData, Task, TaskStatus};
pub use user::User;
