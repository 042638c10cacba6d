pub mod project;
pub mod task;
pub mod user;

pub use project::{Project, ProjectDetails, ProjectInput, ProjectUpdate, MAX_PROJECTS_PER_USER};
pub use task::{Task, TaskInput, TaskStatus, TaskUpdate, MAX_TASKS_PER_PROJECT};
pub use user::User;

/// Trims an optional free-text field in place.
pub(crate) fn trim_opt(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}
