//! Authenticated user reference.

use super::UserId;
use serde::{Deserialize, Serialize};

/// The pre-authenticated user on whose behalf a task operation runs.
///
/// Credentials stay with the authentication layer; tasks only need the
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
}

impl User {
    /// Creates a user reference.
    #[must_use]
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}
