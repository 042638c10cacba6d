//! Persistence for users, projects and tasks.
//!
//! The `Store` trait is the seam between the ownership-scoped services and the database.
//! Implementations must keep these guarantees:
//!
//! - `insert_project` / `insert_task` admit the child and append it to the parent's
//!   back-reference collection as one atomic unit, and only while the collection is below
//!   its limit (a conditional write, not read-then-write);
//! - `delete_project` / `delete_task` remove the child and detach it from the parent in one
//!   atomic unit; detaching an absent reference is a no-op;
//! - deleting a project removes its tasks.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Project, ProjectUpdate, Task, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Short name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Fails with `BadRequest("User already exists")` when the email is taken.
    async fn create_user(&self, user: User) -> Result<User, AppError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Projects owned by `owner`, newest first.
    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, AppError>;
    /// Matches on `id` AND `owner`.
    async fn find_project(&self, owner: Uuid, id: Uuid) -> Result<Option<Project>, AppError>;
    /// Fails with `QuotaExceeded` when the owner already holds `limit` projects.
    async fn insert_project(&self, project: Project, limit: usize) -> Result<Project, AppError>;
    async fn update_project(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: &ProjectUpdate,
    ) -> Result<Option<Project>, AppError>;
    /// Returns whether an owned project was deleted.
    async fn delete_project(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// Tasks of a project, newest first.
    async fn list_tasks(&self, project: Uuid) -> Result<Vec<Task>, AppError>;
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;
    /// Fails with `QuotaExceeded` when the parent already holds `limit` tasks,
    /// or `NotFound` when the parent is gone.
    async fn insert_task(&self, task: Task, limit: usize) -> Result<Task, AppError>;
    /// Persists title, description, status and `updated_at`.
    async fn save_task(&self, task: &Task) -> Result<Task, AppError>;
    /// Returns whether the task was deleted.
    async fn delete_task(&self, task: &Task) -> Result<bool, AppError>;
}

pub(crate) fn user_exists() -> AppError {
    AppError::BadRequest("User already exists".into())
}
