use uuid::Uuid;

use super::projects;
use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskUpdate, User, MAX_TASKS_PER_PROJECT};
use crate::store::Store;

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Tasks of an owned project, newest first.
pub async fn list_for_project(
    store: &dyn Store,
    caller: &User,
    project_id: Uuid,
) -> Result<Vec<Task>, AppError> {
    let project = projects::find_owned(store, caller, project_id).await?;
    store.list_tasks(project.id).await
}

/// Ownership is checked before the quota: a foreign or missing parent is `NotFound`
/// even when it is full.
pub async fn create(store: &dyn Store, caller: &User, input: TaskInput) -> Result<Task, AppError> {
    let project = projects::find_owned(store, caller, input.project).await?;
    let task = store
        .insert_task(Task::new(input, caller.id), MAX_TASKS_PER_PROJECT)
        .await?;
    log::info!("user {} created task {} in {}", caller.id, task.id, project.id);
    Ok(task)
}

/// A task is reachable only through a project the caller owns.
pub async fn find_owned(store: &dyn Store, caller: &User, id: Uuid) -> Result<Task, AppError> {
    let task = store.find_task(id).await?.ok_or_else(not_found)?;
    match store.find_project(caller.id, task.project).await? {
        Some(_) => Ok(task),
        None => Err(not_found()),
    }
}

pub async fn get(store: &dyn Store, caller: &User, id: Uuid) -> Result<Task, AppError> {
    find_owned(store, caller, id).await
}

pub async fn update(
    store: &dyn Store,
    caller: &User,
    id: Uuid,
    changes: TaskUpdate,
) -> Result<Task, AppError> {
    let mut task = find_owned(store, caller, id).await?;
    task.apply(changes);
    store.save_task(&task).await
}

/// Deletes an owned task and detaches it from its project.
pub async fn delete(store: &dyn Store, caller: &User, id: Uuid) -> Result<(), AppError> {
    let task = find_owned(store, caller, id).await?;
    store.delete_task(&task).await?;
    log::info!("user {} deleted task {}", caller.id, id);
    Ok(())
}
