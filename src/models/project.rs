use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{task::Task, trim_opt};

/// Maximum number of projects a single user may own.
pub const MAX_PROJECTS_PER_USER: usize = 4;

/// Payload for creating a project.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ProjectInput {
    /// Must be between 1 and 200 characters after trimming. Absent reads as empty.
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl ProjectInput {
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: trim_opt(self.description),
        }
    }
}

/// Partial update of a project. Absent fields are left unchanged; `owner` cannot be changed.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct ProjectUpdate {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty (max 200 characters)"))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

impl ProjectUpdate {
    pub fn normalized(self) -> Self {
        Self {
            title: trim_opt(self.title),
            description: trim_opt(self.description),
        }
    }
}

/// A project as stored. `tasks` is the back-reference to its tasks, in creation order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner: Uuid,
    pub tasks: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(input: ProjectInput, owner: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            owner,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &ProjectUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        self.updated_at = Utc::now();
    }
}

/// A project with its tasks expanded, as returned by the read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner: Uuid,
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectDetails {
    /// Orders `tasks` by their position in the project's back-reference collection.
    /// Tasks missing from the collection sort last.
    pub fn new(project: Project, mut tasks: Vec<Task>) -> Self {
        tasks.sort_by_key(|task| {
            project
                .tasks
                .iter()
                .position(|id| *id == task.id)
                .unwrap_or(usize::MAX)
        });
        Self {
            id: project.id,
            title: project.title,
            description: project.description,
            owner: project.owner,
            tasks,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}
