//! `PostgreSQL` integration tests for owner-scoped task persistence.

use crate::postgres::helpers::{BoxError, PreparedRepo, insert_user, prepared_repo};
use rstest::rstest;
use std::sync::Arc;
use taskboard::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{NewTask, Task, TaskFilter, TaskKey, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError},
    services::{CreateTaskRequest, TaskService, TaskServiceError},
};

fn new_task(title: &str, description: &str) -> Result<NewTask, BoxError> {
    NewTask::new(title, description).map_err(|err| Box::new(err) as BoxError)
}

async fn create(
    repo: &PostgresTaskRepository,
    title: &str,
    description: &str,
    owner: &taskboard::task::domain::User,
) -> Result<Task, BoxError> {
    let data = new_task(title, description)?;
    Ok(repo.create_task(&data, owner.id()).await?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_create_assigns_id_and_open_status() -> Result<(), BoxError> {
    let Some(PreparedRepo { pool, repo }) = prepared_repo()? else {
        return Ok(());
    };
    let owner = insert_user(&pool, "creator").await?;

    let task = create(&repo, "Persist me", "Stored in PostgreSQL", &owner).await?;
    let fetched = repo.find_one(task.key()).await?;

    assert!(task.id().value() > 0);
    assert_eq!(task.status(), TaskStatus::Open);
    assert_eq!(task.owner_id(), owner.id());
    assert_eq!(fetched, Some(task));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_lookups_and_deletes_are_owner_scoped() -> Result<(), BoxError> {
    let Some(PreparedRepo { pool, repo }) = prepared_repo()? else {
        return Ok(());
    };
    let alice = insert_user(&pool, "alice").await?;
    let bob = insert_user(&pool, "bob").await?;
    let task = create(&repo, "Alice's", "Private", &alice).await?;
    let foreign_key = TaskKey::new(task.id(), bob.id());

    assert_eq!(repo.find_one(foreign_key).await?, None);
    assert_eq!(repo.delete(foreign_key).await?, 0);
    assert_eq!(repo.delete(task.key()).await?, 1);
    assert_eq!(repo.delete(task.key()).await?, 0);
    assert_eq!(repo.find_one(task.key()).await?, None);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_list_applies_owner_status_and_search() -> Result<(), BoxError> {
    let Some(PreparedRepo { pool, repo }) = prepared_repo()? else {
        return Ok(());
    };
    let alice = insert_user(&pool, "lister").await?;
    let bob = insert_user(&pool, "other").await?;
    let first = create(&repo, "Water plants", "Balcony", &alice).await?;
    let mut second = create(&repo, "Call plumber", "Kitchen WATER leak", &alice).await?;
    second.set_status(TaskStatus::Done);
    repo.update(&second).await?;
    let third = create(&repo, "100% done_ish", "literal wildcards", &alice).await?;
    create(&repo, "Water plants", "Bob's balcony", &bob).await?;

    let all = repo.list_tasks(&TaskFilter::new(), alice.id()).await?;
    let water = repo
        .list_tasks(&TaskFilter::new().with_search("water"), alice.id())
        .await?;
    let open_water = repo
        .list_tasks(
            &TaskFilter::new()
                .with_status(TaskStatus::Open)
                .with_search("WATER"),
            alice.id(),
        )
        .await?;
    let literal = repo
        .list_tasks(&TaskFilter::new().with_search("0% d"), alice.id())
        .await?;
    let underscore = repo
        .list_tasks(&TaskFilter::new().with_search("e_i"), alice.id())
        .await?;

    assert_eq!(all, vec![first.clone(), second.clone(), third.clone()]);
    assert_eq!(water, vec![first.clone(), second]);
    assert_eq!(open_water, vec![first]);
    assert_eq!(literal, vec![third.clone()]);
    assert_eq!(underscore, vec![third]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_update_of_foreign_task_is_not_found() -> Result<(), BoxError> {
    let Some(PreparedRepo { pool, repo }) = prepared_repo()? else {
        return Ok(());
    };
    let alice = insert_user(&pool, "owner").await?;
    let bob = insert_user(&pool, "intruder").await?;
    let task = create(&repo, "Guarded", "Keep status", &alice).await?;

    let forged = Task::created(task.id(), &new_task("Guarded", "Keep status")?, bob.id());
    let result = repo.update(&forged).await;

    assert!(matches!(result, Err(TaskRepositoryError::NotFound(id)) if id == task.id()));
    assert_eq!(repo.find_one(task.key()).await?, Some(task));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_service_status_update_round_trip() -> Result<(), BoxError> {
    let Some(PreparedRepo { pool, repo }) = prepared_repo()? else {
        return Ok(());
    };
    let user = insert_user(&pool, "service").await?;
    let service = TaskService::new(Arc::new(repo));

    let created = service
        .create_task(CreateTaskRequest::new("Ship release", "Tag and publish"), &user)
        .await?;
    let updated = service
        .update_task_status(created.id(), TaskStatus::InProgress, &user)
        .await?;
    let fetched = service.get_task_by_id(created.id(), &user).await?;
    service.delete_task_by_id(created.id(), &user).await?;
    let after_delete = service.get_task_by_id(created.id(), &user).await;

    assert_eq!(updated.status(), TaskStatus::InProgress);
    assert_eq!(fetched, updated);
    assert!(matches!(after_delete, Err(TaskServiceError::NotFound(_))));
    Ok(())
}
