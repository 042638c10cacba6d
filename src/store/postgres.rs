use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{user_exists, Store};
use crate::error::AppError;
use crate::models::{Project, ProjectUpdate, Task, User};

const USER_COLUMNS: &str = "id, email, password_hash, projects, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, title, description, owner, tasks, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, title, description, status, project, created_by, created_at, updated_at";

/// Postgres-backed store.
///
/// Back-references live in `UUID[]` columns. Quota admission is a conditional
/// `UPDATE ... WHERE cardinality(..) < limit` on the parent row, which takes the row lock and
/// serializes concurrent creates against the same parent; the child insert runs in the same
/// transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the schema in `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, projects, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.projects)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => user_exists(),
                other => other.into(),
            })
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, AppError> {
        let sql = format!(
            "SELECT {} FROM projects WHERE owner = $1 ORDER BY created_at DESC",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_project(&self, owner: Uuid, id: Uuid) -> Result<Option<Project>, AppError> {
        let sql = format!(
            "SELECT {} FROM projects WHERE id = $1 AND owner = $2",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_project(&self, project: Project, limit: usize) -> Result<Project, AppError> {
        let mut tx = self.pool.begin().await?;

        let admitted = sqlx::query(
            "UPDATE users SET projects = array_append(projects, $2), updated_at = now() \
             WHERE id = $1 AND cardinality(projects) < $3",
        )
        .bind(project.owner)
        .bind(project.id)
        .bind(limit as i32)
        .execute(&mut *tx)
        .await?;

        if admitted.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM users WHERE id = $1")
                .bind(project.owner)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            tx.rollback().await?;
            return Err(if exists {
                AppError::QuotaExceeded {
                    resource: "project",
                    limit,
                }
            } else {
                AppError::NotFound("User not found".into())
            });
        }

        let sql = format!(
            "INSERT INTO projects (id, title, description, owner, tasks, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PROJECT_COLUMNS
        );
        let created = sqlx::query_as::<_, Project>(&sql)
            .bind(project.id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(project.owner)
            .bind(&project.tasks)
            .bind(project.created_at)
            .bind(project.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update_project(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: &ProjectUpdate,
    ) -> Result<Option<Project>, AppError> {
        let sql = format!(
            "UPDATE projects SET title = COALESCE($3, title), \
             description = COALESCE($4, description), updated_at = now() \
             WHERE id = $1 AND owner = $2 RETURNING {}",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .bind(owner)
            .bind(&changes.title)
            .bind(&changes.description)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_project(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // tasks go with the project through ON DELETE CASCADE
        let deleted = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE users SET projects = array_remove(projects, $2), updated_at = now() \
             WHERE id = $1",
        )
        .bind(owner)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list_tasks(&self, project: Uuid) -> Result<Vec<Task>, AppError> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE project = $1 ORDER BY created_at DESC",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(project)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_task(&self, task: Task, limit: usize) -> Result<Task, AppError> {
        let mut tx = self.pool.begin().await?;

        let admitted = sqlx::query(
            "UPDATE projects SET tasks = array_append(tasks, $2), updated_at = now() \
             WHERE id = $1 AND cardinality(tasks) < $3",
        )
        .bind(task.project)
        .bind(task.id)
        .bind(limit as i32)
        .execute(&mut *tx)
        .await?;

        if admitted.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM projects WHERE id = $1")
                .bind(task.project)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            tx.rollback().await?;
            return Err(if exists {
                AppError::QuotaExceeded {
                    resource: "task",
                    limit,
                }
            } else {
                AppError::NotFound("Project not found".into())
            });
        }

        let sql = format!(
            "INSERT INTO tasks (id, title, description, status, project, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            TASK_COLUMNS
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.project)
            .bind(task.created_by)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn save_task(&self, task: &Task) -> Result<Task, AppError> {
        let sql = format!(
            "UPDATE tasks SET title = $2, description = $3, status = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.updated_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    async fn delete_task(&self, task: &Task) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE projects SET tasks = array_remove(tasks, $2), updated_at = now() \
             WHERE id = $1",
        )
        .bind(task.project)
        .bind(task.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(deleted.rows_affected() > 0)
    }
}
