//! Repository command handlers

use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{Commit, Repository};
use crate::AppState;

/// Create a new repository
pub async fn create_repository(
    state: &AppState,
    name: String,
    properties: Option<BTreeMap<String, String>>,
) -> Result<Repository> {
    state.repositories.create_repository(Repository {
        name,
        properties: properties.unwrap_or_default(),
    })
}

/// Get repository information
pub async fn get_repository(state: &AppState, name: String) -> Result<Repository> {
    state.repositories.get_repository(&name)
}

/// List all repositories
pub async fn list_repositories(state: &AppState) -> Result<Vec<Repository>> {
    Ok(state.repositories.list_repositories())
}

/// Delete a repository, aborting its running operations
pub async fn delete_repository(state: &AppState, name: String) -> Result<()> {
    state.operations.delete_repository(&name).await
}

/// Record a new commit
pub async fn create_commit(
    state: &AppState,
    repository: String,
    commit_id: String,
    properties: Option<BTreeMap<String, String>>,
) -> Result<Commit> {
    state
        .repositories
        .create_commit(&repository, &commit_id, properties.unwrap_or_default())
}

/// Get a single commit
pub async fn get_commit(state: &AppState, repository: String, commit_id: String) -> Result<Commit> {
    state.repositories.get_commit(&repository, &commit_id)
}

/// List commits, newest first
pub async fn list_commits(state: &AppState, repository: String) -> Result<Vec<Commit>> {
    state.repositories.list_commits(&repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TitanError;
    use crate::commands::operations;
    use crate::test_utils::{test_state, wait_for_terminal, Behavior, ScriptedEngine};

    #[tokio::test]
    async fn test_repository_lifecycle() {
        let state = test_state(ScriptedEngine::new(Behavior::Succeed));
        create_repository(&state, "r2".into(), None).await.unwrap();
        assert_eq!(list_repositories(&state).await.unwrap().len(), 2);

        delete_repository(&state, "r2".into()).await.unwrap();
        assert!(matches!(
            get_repository(&state, "r2".into()).await,
            Err(TitanError::RepositoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recreated_repository_starts_without_operations() {
        let state = test_state(ScriptedEngine::new(Behavior::Succeed));
        let operation =
            operations::start_push(&state, "r1".into(), "origin".into(), "c1".into(), None)
                .await
                .unwrap();
        wait_for_terminal(&state, "r1", &operation.id).await;

        delete_repository(&state, "r1".into()).await.unwrap();
        create_repository(&state, "r1".into(), None).await.unwrap();

        let listed = operations::list_operations(&state, "r1".into()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_commits() {
        let state = test_state(ScriptedEngine::new(Behavior::Succeed));
        let mut properties = BTreeMap::new();
        properties.insert("message".to_string(), "second".to_string());

        let commit = create_commit(&state, "r1".into(), "c2".into(), Some(properties))
            .await
            .unwrap();
        assert_eq!(commit.properties["message"], "second");
        assert_eq!(get_commit(&state, "r1".into(), "c2".into()).await.unwrap(), commit);
        assert_eq!(list_commits(&state, "r1".into()).await.unwrap().len(), 2);
    }
}
