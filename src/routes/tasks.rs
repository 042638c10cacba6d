use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskUpdate},
    services::tasks,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Lists the tasks of an owned project, newest first.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks.
/// - `404 Not Found`: no such project owned by the caller.
#[get("/project/{project_id}")]
pub async fn list_project_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let tasks = tasks::list_for_project(state.store.as_ref(), &user.0, project_id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task in an owned project.
///
/// ## Request Body:
/// - `title`: required, 1-200 characters after trimming.
/// - `description` (optional).
/// - `status` (optional): `TODO`, `IN_PROGRESS` or `COMPLETED`. Defaults to `TODO`.
/// - `project`: id of a project owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: invalid fields, or the project already holds 100 tasks.
/// - `404 Not Found`: the project does not exist or is not owned by the caller.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let input = task_data.into_inner().normalized();
    input.validate()?;

    let task = tasks::create(state.store.as_ref(), &user.0, input).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Fetches a task reachable through one of the caller's projects.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = tasks::get(state.store.as_ref(), &user.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task. Status changes go through `Task::update_status`.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    let changes = task_data.into_inner().normalized();
    changes.validate()?;

    let task = tasks::update(state.store.as_ref(), &user.0, task_id.into_inner(), changes).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    tasks::delete(state.store.as_ref(), &user.0, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}
