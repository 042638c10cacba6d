use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::trim_opt;

/// Maximum number of tasks a single project may hold.
pub const MAX_TASKS_PER_PROJECT: usize = 100;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is finished.
    Completed,
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task.
    /// Must be between 1 and 200 characters. Absent reads as empty.
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    pub title: String,

    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to `TODO` when omitted.
    pub status: Option<TaskStatus>,

    /// The parent project. Must be owned by the caller.
    pub project: Uuid,
}

impl TaskInput {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: trim_opt(self.description),
            ..self
        }
    }
}

/// Partial update of a task. The parent project is immutable and is not accepted here.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty (max 200 characters)"))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,
}

impl TaskUpdate {
    pub fn normalized(self) -> Self {
        Self {
            title: trim_opt(self.title),
            description: trim_opt(self.description),
            status: self.status,
        }
    }
}

/// Represents a task entity as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Parent project; fixed at creation.
    pub project: Uuid,
    /// The user who created the task. Not an authorization fact.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(input: TaskInput, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            project: input.project,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// The only place a task's status changes. Every transition between the three
    /// statuses is currently allowed.
    pub fn update_status(&mut self, status: TaskStatus) {
        if self.status != status {
            log::debug!("task {} status {:?} -> {:?}", self.id, self.status, status);
            self.status = status;
        }
        self.updated_at = Utc::now();
    }

    pub fn apply(&mut self, update: TaskUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(status) = update.status {
            self.update_status(status);
        }
        self.updated_at = Utc::now();
    }
}
