//! Listing filter applied to a user's tasks.

use super::{Task, TaskStatus};
use serde::{Deserialize, Serialize};

/// Optional status and free-text restrictions for task listings.
///
/// Both restrictions compose with AND. An empty search string matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    status: Option<TaskStatus>,
    search: Option<String>,
}

impl TaskFilter {
    /// Creates a filter that matches every owned task.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: None,
            search: None,
        }
    }

    /// Restricts results to the given status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts results to tasks whose title or description contains the
    /// text, ignoring case.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Returns the status restriction, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the search text, or `None` when absent or empty.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|term| !term.is_empty())
    }

    /// Evaluates the filter against a task.
    ///
    /// Owner scoping is the store's concern and is not checked here.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let status_matches = self.status.is_none_or(|status| task.status() == status);
        status_matches && self.search_term().is_none_or(|term| search_matches(task, term))
    }
}

fn search_matches(task: &Task, term: &str) -> bool {
    let needle = term.to_lowercase();
    task.title().to_lowercase().contains(&needle)
        || task.description().to_lowercase().contains(&needle)
}
