//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{NewTaskRow, TaskChangeset, TaskRow},
    schema::tasks,
};
use crate::task::{
    domain::{
        NewTask, PersistedTaskData, Task, TaskFilter, TaskId, TaskKey, TaskStatus, UserId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::dsl;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Single-row selection constrained to the task's owner.
type OwnedTask = dsl::Filter<
    dsl::Filter<tasks::table, dsl::Eq<tasks::id, i64>>,
    dsl::Eq<tasks::user_id, i64>,
>;

/// Idempotent DDL creating the `users` and `tasks` tables.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000000_create_users_and_tasks/up.sql");

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    /// Creates the task tables when they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when a connection cannot
    /// be obtained or the DDL fails.
    pub async fn synchronize_schema(&self) -> TaskRepositoryResult<()> {
        self.run_blocking(|connection| {
            connection
                .batch_execute(CREATE_SCHEMA_SQL)
                .map_err(TaskRepositoryError::persistence)
        })
        .await?;
        tracing::info!("task schema synchronized");
        Ok(())
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn list_tasks(
        &self,
        filter: &TaskFilter,
        owner_id: UserId,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let query = list_query(filter, owner_id);
        self.run_blocking(move |connection| {
            let rows = query
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn find_one(&self, key: TaskKey) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = owned_task(key)
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn create_task(&self, data: &NewTask, owner_id: UserId) -> TaskRepositoryResult<Task> {
        let title = data.title().to_owned();
        let description = data.description().to_owned();
        self.run_blocking(move |connection| {
            let new_row = NewTaskRow {
                title: &title,
                description: &description,
                status: TaskStatus::Open.as_str(),
                user_id: owner_id.value(),
            };
            let row = diesel::insert_into(tasks::table)
                .values(&new_row)
                .returning(TaskRow::as_returning())
                .get_result::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            row_to_task(row)
        })
        .await
    }

    async fn delete(&self, key: TaskKey) -> TaskRepositoryResult<u64> {
        self.run_blocking(move |connection| {
            let affected = diesel::delete(owned_task(key))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            u64::try_from(affected).map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let key = task.key();
        let changeset = TaskChangeset {
            title: task.title().to_owned(),
            description: task.description().to_owned(),
            status: task.status().as_str().to_owned(),
        };
        self.run_blocking(move |connection| {
            let affected = diesel::update(owned_task(key))
                .set(&changeset)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if affected == 0 {
                return Err(TaskRepositoryError::NotFound(key.id));
            }
            Ok(())
        })
        .await
    }
}

/// Selects the task matching both halves of the key.
fn owned_task(key: TaskKey) -> OwnedTask {
    tasks::table
        .filter(tasks::id.eq(key.id.value()))
        .filter(tasks::user_id.eq(key.owner_id.value()))
}

/// Builds the owner-scoped listing query for a filter.
fn list_query(filter: &TaskFilter, owner_id: UserId) -> tasks::BoxedQuery<'static, Pg> {
    let mut query = tasks::table
        .filter(tasks::user_id.eq(owner_id.value()))
        .order(tasks::id.asc())
        .into_boxed();

    if let Some(status) = filter.status() {
        query = query.filter(tasks::status.eq(status.as_str()));
    }

    if let Some(term) = filter.search_term() {
        let pattern = contains_pattern(term);
        query = query.filter(
            tasks::title
                .ilike(pattern.clone())
                .or(tasks::description.ilike(pattern)),
        );
    }

    query
}

/// Wraps a search term in `%` wildcards, escaping `LIKE` metacharacters so
/// the term matches literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        status: persisted_status,
        user_id,
    } = row;

    let status = TaskStatus::try_from(persisted_status.as_str())
        .map_err(TaskRepositoryError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::new(id),
        title,
        description,
        status,
        owner_id: UserId::new(user_id),
    }))
}
