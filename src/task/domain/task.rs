//! Task aggregate and related status types.

use super::{ParseTaskStatusError, TaskDomainError, TaskId, TaskKey, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task progress status.
///
/// Serializes to the canonical upper-case name. Deserialization accepts the
/// same text as [`TaskStatus::try_from`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum TaskStatus {
    /// Work has not started.
    #[default]
    Open,
    /// Work is underway.
    InProgress,
    /// Work is finished.
    Done,
}

impl TaskStatus {
    /// All statuses in declaration order.
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Done];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    title: String,
    description: String,
}

impl NewTask {
    /// Creates validated task input.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::EmptyDescription`] when either field is blank.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, TaskDomainError> {
        let title_value = title.into();
        if title_value.trim().is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let description_value = description.into();
        if description_value.trim().is_empty() {
            return Err(TaskDomainError::EmptyDescription);
        }
        Ok(Self {
            title: title_value,
            description: description_value,
        })
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Task record owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    status: TaskStatus,
    owner_id: UserId,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Store-assigned identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: String,
    /// Persisted status.
    pub status: TaskStatus,
    /// Owning user.
    pub owner_id: UserId,
}

impl Task {
    /// Builds the record for a freshly stored task.
    ///
    /// New tasks always start [`TaskStatus::Open`].
    #[must_use]
    pub fn created(id: TaskId, data: &NewTask, owner_id: UserId) -> Self {
        Self {
            id,
            title: data.title().to_owned(),
            description: data.description().to_owned(),
            status: TaskStatus::Open,
            owner_id,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            owner_id: data.owner_id,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owner-scoped key of this task.
    #[must_use]
    pub const fn key(&self) -> TaskKey {
        TaskKey::new(self.id, self.owner_id)
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the owning user identifier.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Replaces the status. Any status may follow any other.
    pub const fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }
}
