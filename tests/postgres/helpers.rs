//! Shared test helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use taskboard::task::{
    adapters::postgres::{CREATE_SCHEMA_SQL, PostgresTaskRepository, TaskPgPool},
    domain::{User, UserId},
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming the test database.
pub const DATABASE_URL_VAR: &str = "TASKBOARD_TEST_DATABASE_URL";

static SCHEMA_LOCK: Mutex<bool> = Mutex::new(false);
static USER_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Opens every pooled connection inside a test transaction.
#[derive(Debug)]
struct TestTransaction;

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for TestTransaction {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.begin_test_transaction()
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Repository and pool sharing one rolled-back connection.
pub struct PreparedRepo {
    /// Pool holding the single transactional connection.
    pub pool: TaskPgPool,
    /// Repository under test.
    pub repo: PostgresTaskRepository,
}

/// Builds a repository whose work is rolled back when the pool drops.
///
/// Returns `Ok(None)` when no test database is configured.
///
/// # Errors
///
/// Returns an error if the schema cannot be applied or the pool cannot be
/// built.
pub fn prepared_repo() -> Result<Option<PreparedRepo>, BoxError> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        return Ok(None);
    };
    ensure_schema(&url)?;

    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(TestTransaction))
        .build(manager)
        .map_err(|err| Box::new(err) as BoxError)?;
    let repo = PostgresTaskRepository::new(pool.clone());
    Ok(Some(PreparedRepo { pool, repo }))
}

/// Applies the task schema once per test process, outside any test
/// transaction.
fn ensure_schema(url: &str) -> Result<(), BoxError> {
    let mut applied = SCHEMA_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if *applied {
        return Ok(());
    }
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(CREATE_SCHEMA_SQL)
        .map_err(|err| Box::new(err) as BoxError)?;
    *applied = true;
    Ok(())
}

#[derive(diesel::QueryableByName)]
struct InsertedUser {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    id: i64,
}

/// Inserts a user row inside the test transaction.
///
/// # Errors
///
/// Returns an error if a connection cannot be obtained or the insert fails.
pub async fn insert_user(pool: &TaskPgPool, name: &str) -> Result<User, BoxError> {
    let pool_handle = pool.clone();
    let username = format!(
        "{name}-{}-{}",
        std::process::id(),
        USER_SEQUENCE.fetch_add(1, Ordering::Relaxed)
    );
    let insert_name = username.clone();
    let row = tokio::task::spawn_blocking(move || {
        let mut conn = pool_handle.get().map_err(|err| Box::new(err) as BoxError)?;
        diesel::sql_query(
            "INSERT INTO users (username, password, salt) VALUES ($1, 'hash', 'salt') RETURNING id",
        )
        .bind::<diesel::sql_types::Text, _>(insert_name)
        .get_result::<InsertedUser>(&mut conn)
        .map_err(|err| Box::new(err) as BoxError)
    })
    .await
    .map_err(|err| Box::new(err) as BoxError)??;
    Ok(User::new(UserId::new(row.id), username))
}
