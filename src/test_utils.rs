//! Test utilities: a scriptable transfer engine and pre-populated state

#![cfg(test)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{NopRemote, Operation, Remote, RemoteParameters, Repository};
use crate::services::{CancellationToken, ProgressSink, TransferEngine, TransferError, TransferRequest};
use crate::AppState;

/// How a [`ScriptedEngine`] transfer ends
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Report some progress and succeed
    Succeed,
    /// Report some progress and fail with a network error
    Fail(&'static str),
    /// Wait for cancellation, then acknowledge it
    BlockUntilCancelled,
    /// Wait for cancellation, then succeed anyway
    CompleteDespiteCancel,
    /// Wait for cancellation, then fail with a non-cancel error
    FailOnCancel,
    /// Report cancellation without any abort having been requested
    CancelUnprompted,
    Panic,
}

/// Transfer engine whose outcome is fixed up front
pub struct ScriptedEngine {
    behavior: Behavior,
    remote_commits: Option<Vec<String>>,
    seen: Arc<Mutex<Vec<RemoteParameters>>>,
}

impl ScriptedEngine {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            remote_commits: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Restrict which commits the remote claims to have
    pub fn with_remote_commits(mut self, commits: &[&str]) -> Self {
        self.remote_commits = Some(commits.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Parameters of every transfer the engine has run
    pub fn seen_parameters(&self) -> Arc<Mutex<Vec<RemoteParameters>>> {
        self.seen.clone()
    }

    async fn run(
        &self,
        request: &TransferRequest,
        cancel: CancellationToken,
        progress: ProgressSink,
    ) -> Result<(), TransferError> {
        self.seen.lock().unwrap().push(request.parameters.clone());
        progress.start(format!("Transferring {}", request.commit_id));

        match self.behavior {
            Behavior::Succeed => {
                progress.progress("Halfway", 50);
                progress.end("Transferred");
                Ok(())
            }
            Behavior::Fail(message) => {
                progress.progress("Halfway", 50);
                Err(TransferError::Network(message.to_string()))
            }
            Behavior::BlockUntilCancelled => {
                cancel.cancelled().await;
                Err(TransferError::Cancelled)
            }
            Behavior::CompleteDespiteCancel => {
                cancel.cancelled().await;
                progress.end("Past the point of no return");
                Ok(())
            }
            Behavior::FailOnCancel => {
                cancel.cancelled().await;
                Err(TransferError::Network("connection closed".to_string()))
            }
            Behavior::CancelUnprompted => Err(TransferError::Cancelled),
            Behavior::Panic => panic!("engine exploded"),
        }
    }
}

#[async_trait]
impl TransferEngine for ScriptedEngine {
    async fn send_commit(
        &self,
        request: &TransferRequest,
        cancel: CancellationToken,
        progress: ProgressSink,
    ) -> Result<(), TransferError> {
        self.run(request, cancel, progress).await
    }

    async fn receive_commit(
        &self,
        request: &TransferRequest,
        cancel: CancellationToken,
        progress: ProgressSink,
    ) -> Result<(), TransferError> {
        self.run(request, cancel, progress).await
    }

    async fn remote_commit_exists(
        &self,
        _remote: &Remote,
        _parameters: &RemoteParameters,
        commit_id: &str,
    ) -> Result<bool, TransferError> {
        Ok(match &self.remote_commits {
            Some(commits) => commits.iter().any(|c| c == commit_id),
            None => true,
        })
    }
}

/// State with repository `r1`, commit `c1`, and nop remote `origin`
pub fn test_state(engine: impl TransferEngine + 'static) -> AppState {
    let state = AppState::new(Arc::new(engine));
    state
        .repositories
        .create_repository(Repository {
            name: "r1".to_string(),
            properties: BTreeMap::new(),
        })
        .expect("Failed to create repository");
    state
        .repositories
        .create_commit("r1", "c1", BTreeMap::new())
        .expect("Failed to create commit");
    state
        .repositories
        .add_remote(
            "r1",
            Remote::Nop(NopRemote {
                name: "origin".to_string(),
            }),
        )
        .expect("Failed to add remote");
    state
}

/// Poll until the operation leaves `RUNNING`
pub async fn wait_for_terminal(state: &AppState, repository: &str, id: &str) -> Operation {
    for _ in 0..500 {
        let operation = state
            .operations
            .get_operation(repository, id)
            .expect("Operation disappeared");
        if operation.state.is_terminal() {
            return operation;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Operation {} never finished", id);
}
