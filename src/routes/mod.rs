pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;

use actix_web::{web, HttpRequest};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers every route. Only `/api/auth/signup` and `/api/auth/login` (and `/health`) are
/// reachable without a bearer token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(health::health)
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .service(auth::signup)
                        .service(auth::login)
                        .service(
                            web::resource("/me")
                                .wrap(AuthMiddleware)
                                .route(web::get().to(auth::me)),
                        ),
                )
                .service(
                    web::scope("/projects")
                        .wrap(AuthMiddleware)
                        .service(projects::list_projects)
                        .service(projects::create_project)
                        .service(projects::get_project)
                        .service(projects::update_project)
                        .service(projects::delete_project),
                )
                .service(
                    web::scope("/tasks")
                        .wrap(AuthMiddleware)
                        .service(tasks::list_project_tasks)
                        .service(tasks::create_task)
                        .service(tasks::get_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task),
                ),
        );
}

/// Unparsable or incomplete JSON bodies are a 400 with a message, like other input errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req: &HttpRequest| AppError::BadRequest(err.to_string()).into())
}

/// An id that is not a UUID cannot name an existing resource.
fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req: &HttpRequest| {
        log::debug!("unparsable path {}: {}", req.path(), err);
        AppError::NotFound("Resource not found".into()).into()
    })
}
