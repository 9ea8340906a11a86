//! Diesel row models for task persistence.

use super::schema::tasks;
use diesel::prelude::*;

/// Query result row for task records.
///
/// Field order follows the `tasks` column order so plain `load` works on
/// boxed queries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: i64,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Task status.
    pub status: String,
    /// Owning user.
    pub user_id: i64,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow<'a> {
    /// Task title.
    pub title: &'a str,
    /// Task description.
    pub description: &'a str,
    /// Initial status.
    pub status: &'a str,
    /// Owning user.
    pub user_id: i64,
}

/// Mutable task columns written by updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskChangeset {
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Task status.
    pub status: String,
}
