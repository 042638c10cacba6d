use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Project, ProjectDetails, ProjectInput, ProjectUpdate, User, MAX_PROJECTS_PER_USER,
};
use crate::store::Store;

fn not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}

/// The caller's projects, newest first, with tasks expanded.
pub async fn list(store: &dyn Store, caller: &User) -> Result<Vec<ProjectDetails>, AppError> {
    let projects = store.list_projects(caller.id).await?;
    let mut details = Vec::with_capacity(projects.len());
    for project in projects {
        let tasks = store.list_tasks(project.id).await?;
        details.push(ProjectDetails::new(project, tasks));
    }
    Ok(details)
}

/// Looks a project up by `(id, owner)`; never by id alone.
pub async fn find_owned(store: &dyn Store, caller: &User, id: Uuid) -> Result<Project, AppError> {
    store
        .find_project(caller.id, id)
        .await?
        .ok_or_else(not_found)
}

pub async fn get(store: &dyn Store, caller: &User, id: Uuid) -> Result<ProjectDetails, AppError> {
    let project = find_owned(store, caller, id).await?;
    let tasks = store.list_tasks(project.id).await?;
    Ok(ProjectDetails::new(project, tasks))
}

/// Creates a project owned by the caller, consuming one of their project slots.
pub async fn create(
    store: &dyn Store,
    caller: &User,
    input: ProjectInput,
) -> Result<Project, AppError> {
    let project = store
        .insert_project(Project::new(input, caller.id), MAX_PROJECTS_PER_USER)
        .await?;
    log::info!("user {} created project {}", caller.id, project.id);
    Ok(project)
}

pub async fn update(
    store: &dyn Store,
    caller: &User,
    id: Uuid,
    changes: ProjectUpdate,
) -> Result<Project, AppError> {
    store
        .update_project(caller.id, id, &changes)
        .await?
        .ok_or_else(not_found)
}

/// Deletes an owned project with its tasks and drops it from the caller's collection.
pub async fn delete(store: &dyn Store, caller: &User, id: Uuid) -> Result<(), AppError> {
    if !store.delete_project(caller.id, id).await? {
        return Err(not_found());
    }
    log::info!("user {} deleted project {}", caller.id, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(User::new(email.into(), "hash".into()))
            .await
            .unwrap()
    }

    fn input(title: &str) -> ProjectInput {
        ProjectInput {
            title: title.into(),
            description: None,
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_fifth_project_is_rejected_and_state_unchanged() {
        let store = MemoryStore::new();
        let alice = user(&store, "a@x.com").await;

        for i in 0..4 {
            create(&store, &alice, input(&format!("p{}", i))).await.unwrap();
        }
        let err = create(&store, &alice, input("p4")).await.unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { resource: "project", limit: 4 }));

        assert_eq!(list(&store, &alice).await.unwrap().len(), 4);
        assert_eq!(
            store.find_user(alice.id).await.unwrap().unwrap().projects.len(),
            4
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_foreign_project_is_not_found() {
        let store = MemoryStore::new();
        let alice = user(&store, "a@x.com").await;
        let bob = user(&store, "b@x.com").await;
        let project = create(&store, &alice, input("mine")).await.unwrap();

        assert!(matches!(
            get(&store, &bob, project.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            update(&store, &bob, project.id, ProjectUpdate::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete(&store, &bob, project.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(list(&store, &bob).await.unwrap().is_empty());
        assert_eq!(get(&store, &alice, project.id).await.unwrap().title, "mine");
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_frees_a_slot() {
        let store = MemoryStore::new();
        let alice = user(&store, "a@x.com").await;
        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(create(&store, &alice, input(&format!("p{}", i))).await.unwrap().id);
        }

        delete(&store, &alice, ids[0]).await.unwrap();
        assert!(create(&store, &alice, input("again")).await.is_ok());
        assert!(store.audit().unwrap().is_empty());
    }
}
