//! Operation command handlers

use crate::error::Result;
use crate::models::{Operation, ProgressEntry, RemoteParameters};
use crate::AppState;

/// List all operations for a repository
pub async fn list_operations(state: &AppState, repository: String) -> Result<Vec<Operation>> {
    state.operations.list_operations(&repository)
}

/// Get a single operation
pub async fn get_operation(
    state: &AppState,
    repository: String,
    operation_id: String,
) -> Result<Operation> {
    state.operations.get_operation(&repository, &operation_id)
}

/// Get the progress log of an operation
pub async fn get_progress(
    state: &AppState,
    repository: String,
    operation_id: String,
) -> Result<Vec<ProgressEntry>> {
    state.operations.get_progress(&repository, &operation_id)
}

/// Abort an operation; answers with no content
pub async fn abort_operation(
    state: &AppState,
    repository: String,
    operation_id: String,
) -> Result<()> {
    state
        .operations
        .abort_operation(&repository, &operation_id)
        .await
}

/// Pull a commit from a remote
pub async fn start_pull(
    state: &AppState,
    repository: String,
    remote: String,
    commit_id: String,
    parameters: Option<RemoteParameters>,
) -> Result<Operation> {
    state
        .operations
        .start_pull(&repository, &remote, &commit_id, parameters)
        .await
}

/// Push a commit to a remote
pub async fn start_push(
    state: &AppState,
    repository: String,
    remote: String,
    commit_id: String,
    parameters: Option<RemoteParameters>,
) -> Result<Operation> {
    state
        .operations
        .start_push(&repository, &remote, &commit_id, parameters)
        .await
}
