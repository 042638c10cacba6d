use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{user_exists, Store};
use crate::error::AppError;
use crate::graph::{self, Divergence};
use crate::models::{Project, ProjectUpdate, Task, User};

#[derive(Default)]
struct Graph {
    users: HashMap<Uuid, User>,
    /// Insertion order; iterated in reverse for newest-first listings.
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

/// In-process store. Every operation runs under one lock, so each create/delete and its
/// back-reference update form a single critical section.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Graph>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Graph>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".into()))
    }

    /// Every back-reference mismatch across the whole tree.
    pub fn audit(&self) -> Result<Vec<Divergence>, AppError> {
        let graph = self.lock()?;
        let mut found = Vec::new();
        for user in graph.users.values() {
            let children = graph.projects.iter().map(|p| (p.id, p.owner));
            found.extend(graph::divergences(user.id, &user.projects, children));
        }
        for project in &graph.projects {
            let children = graph.tasks.iter().map(|t| (t.id, t.project));
            found.extend(graph::divergences(project.id, &project.tasks, children));
        }
        Ok(found)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut graph = self.lock()?;
        if graph.users.values().any(|u| u.email == user.email) {
            return Err(user_exists());
        }
        graph.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_projects(&self, owner: Uuid) -> Result<Vec<Project>, AppError> {
        Ok(self
            .lock()?
            .projects
            .iter()
            .rev()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect())
    }

    async fn find_project(&self, owner: Uuid, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self
            .lock()?
            .projects
            .iter()
            .find(|p| p.id == id && p.owner == owner)
            .cloned())
    }

    async fn insert_project(&self, project: Project, limit: usize) -> Result<Project, AppError> {
        let mut graph = self.lock()?;
        let owner = graph
            .users
            .get_mut(&project.owner)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if !graph::has_room(&owner.projects, limit) {
            return Err(AppError::QuotaExceeded {
                resource: "project",
                limit,
            });
        }
        graph::attach(&mut owner.projects, project.id);
        owner.updated_at = Utc::now();
        graph.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: &ProjectUpdate,
    ) -> Result<Option<Project>, AppError> {
        let mut graph = self.lock()?;
        Ok(graph
            .projects
            .iter_mut()
            .find(|p| p.id == id && p.owner == owner)
            .map(|project| {
                project.apply(changes);
                project.clone()
            }))
    }

    async fn delete_project(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut graph = self.lock()?;
        let before = graph.projects.len();
        graph.projects.retain(|p| !(p.id == id && p.owner == owner));
        if graph.projects.len() == before {
            return Ok(false);
        }
        graph.tasks.retain(|t| t.project != id);
        if let Some(user) = graph.users.get_mut(&owner) {
            graph::detach(&mut user.projects, id);
            user.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn list_tasks(&self, project: Uuid) -> Result<Vec<Task>, AppError> {
        Ok(self
            .lock()?
            .tasks
            .iter()
            .rev()
            .filter(|t| t.project == project)
            .cloned()
            .collect())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self.lock()?.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_task(&self, task: Task, limit: usize) -> Result<Task, AppError> {
        let mut graph = self.lock()?;
        let parent = graph
            .projects
            .iter_mut()
            .find(|p| p.id == task.project)
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
        if !graph::has_room(&parent.tasks, limit) {
            return Err(AppError::QuotaExceeded {
                resource: "task",
                limit,
            });
        }
        graph::attach(&mut parent.tasks, task.id);
        parent.updated_at = Utc::now();
        graph.tasks.push(task.clone());
        Ok(task)
    }

    async fn save_task(&self, task: &Task) -> Result<Task, AppError> {
        let mut graph = self.lock()?;
        let stored = graph
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.updated_at = task.updated_at;
        Ok(stored.clone())
    }

    async fn delete_task(&self, task: &Task) -> Result<bool, AppError> {
        let mut graph = self.lock()?;
        let before = graph.tasks.len();
        graph.tasks.retain(|t| t.id != task.id);
        let deleted = graph.tasks.len() != before;
        if let Some(parent) = graph.projects.iter_mut().find(|p| p.id == task.project) {
            graph::detach(&mut parent.tasks, task.id);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectInput, TaskInput, MAX_PROJECTS_PER_USER, MAX_TASKS_PER_PROJECT};
    use pretty_assertions::assert_eq;

    async fn seeded() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = store
            .create_user(User::new("a@x.com".into(), "hash".into()))
            .await
            .unwrap();
        (store, user)
    }

    fn project(owner: Uuid, title: &str) -> Project {
        Project::new(
            ProjectInput {
                title: title.into(),
                description: None,
            },
            owner,
        )
    }

    fn task(project: Uuid, creator: Uuid) -> Task {
        Task::new(
            TaskInput {
                title: "t".into(),
                description: None,
                status: None,
                project,
            },
            creator,
        )
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (store, _) = seeded().await;
        let err = store
            .create_user(User::new("a@x.com".into(), "other".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "User already exists"));
    }

    #[tokio::test]
    async fn test_project_quota_and_back_reference() {
        let (store, user) = seeded().await;
        for i in 0..MAX_PROJECTS_PER_USER {
            store
                .insert_project(project(user.id, &format!("p{}", i)), MAX_PROJECTS_PER_USER)
                .await
                .unwrap();
        }
        let err = store
            .insert_project(project(user.id, "extra"), MAX_PROJECTS_PER_USER)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { limit: 4, .. }));

        let owner = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(owner.projects.len(), MAX_PROJECTS_PER_USER);
        let titles: Vec<String> = store
            .list_projects(user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["p3", "p2", "p1", "p0"]);
        assert!(store.audit().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_project_cascades_and_detaches() {
        let (store, user) = seeded().await;
        let p = store
            .insert_project(project(user.id, "p"), MAX_PROJECTS_PER_USER)
            .await
            .unwrap();
        let t = store
            .insert_task(task(p.id, user.id), MAX_TASKS_PER_PROJECT)
            .await
            .unwrap();

        assert!(!store.delete_project(Uuid::new_v4(), p.id).await.unwrap());
        assert!(store.delete_project(user.id, p.id).await.unwrap());
        assert!(!store.delete_project(user.id, p.id).await.unwrap());

        assert!(store.find_task(t.id).await.unwrap().is_none());
        assert!(store.list_tasks(p.id).await.unwrap().is_empty());
        let owner = store.find_user(user.id).await.unwrap().unwrap();
        assert!(owner.projects.is_empty());
        assert!(store.audit().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_quota_and_delete_is_idempotent() {
        let (store, user) = seeded().await;
        let p = store
            .insert_project(project(user.id, "p"), MAX_PROJECTS_PER_USER)
            .await
            .unwrap();
        let first = store.insert_task(task(p.id, user.id), 2).await.unwrap();
        store.insert_task(task(p.id, user.id), 2).await.unwrap();
        let err = store.insert_task(task(p.id, user.id), 2).await.unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { resource: "task", limit: 2 }));

        assert!(store.delete_task(&first).await.unwrap());
        assert!(!store.delete_task(&first).await.unwrap());
        let parent = store.find_project(user.id, p.id).await.unwrap().unwrap();
        assert_eq!(parent.tasks.len(), 1);
        assert!(store.audit().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_project_for_missing_owner() {
        let store = MemoryStore::new();
        let err = store
            .insert_project(project(Uuid::new_v4(), "p"), MAX_PROJECTS_PER_USER)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "User not found"));
    }

    #[tokio::test]
    async fn test_insert_task_into_missing_project() {
        let (store, user) = seeded().await;
        let err = store
            .insert_task(task(Uuid::new_v4(), user.id), MAX_TASKS_PER_PROJECT)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
