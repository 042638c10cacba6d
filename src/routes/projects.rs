use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{ProjectInput, ProjectUpdate},
    services::projects,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Lists the caller's projects, newest first, with their tasks expanded.
///
/// ## Responses:
/// - `200 OK`: JSON array of projects.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[get("")]
pub async fn list_projects(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let projects = projects::list(state.store.as_ref(), &user.0).await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// Creates a project owned by the caller.
///
/// ## Request Body:
/// - `title`: required, 1-200 characters after trimming.
/// - `description` (optional).
///
/// ## Responses:
/// - `201 Created`: the new project.
/// - `400 Bad Request`: invalid fields, or the caller already owns 4 projects.
#[post("")]
pub async fn create_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_data: web::Json<ProjectInput>,
) -> Result<impl Responder, AppError> {
    let input = project_data.into_inner().normalized();
    input.validate()?;

    let project = projects::create(state.store.as_ref(), &user.0, input).await?;
    Ok(HttpResponse::Created().json(project))
}

/// Fetches one owned project with its tasks. Foreign projects are 404.
#[get("/{id}")]
pub async fn get_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = projects::get(state.store.as_ref(), &user.0, project_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Partially updates an owned project.
///
/// ## Responses:
/// - `200 OK`: the updated project.
/// - `400 Bad Request`: invalid fields.
/// - `404 Not Found`: no such project owned by the caller.
#[put("/{id}")]
pub async fn update_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
    project_data: web::Json<ProjectUpdate>,
) -> Result<impl Responder, AppError> {
    let changes = project_data.into_inner().normalized();
    changes.validate()?;

    let project =
        projects::update(state.store.as_ref(), &user.0, project_id.into_inner(), changes).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Deletes an owned project and its tasks.
#[delete("/{id}")]
pub async fn delete_project(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    projects::delete(state.store.as_ref(), &user.0, project_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Project deleted successfully" })))
}
