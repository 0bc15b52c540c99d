//! Operation orchestration
//!
//! Every push or pull becomes an [`Operation`] that is published already
//! `RUNNING` and then driven to completion on its own tokio task. The task is
//! the only writer that moves an operation out of `RUNNING`; callers observe
//! it through snapshots and may request a cooperative abort.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{Result, TitanError};
use crate::models::{
    Operation, OperationState, OperationType, ProgressEntry, ProgressKind, Remote, RemoteParameters,
};
use crate::services::cancellation::CancellationToken;
use crate::services::remote::RemoteRegistry;
use crate::services::repository_service::RepositoryService;
use crate::services::transfer::{TransferEngine, TransferError, TransferRequest};
use crate::services::{lock, read_lock, write_lock};

struct OperationRecord {
    operation: Operation,
    progress: Vec<ProgressEntry>,
}

impl OperationRecord {
    /// Wall clock, clamped so the log never goes backwards
    fn next_timestamp(&self) -> DateTime<Utc> {
        Utc::now().max(self.operation.updated_at)
    }

    fn push(&mut self, kind: ProgressKind, message: String, percent: Option<u8>) {
        let timestamp = self.next_timestamp();
        self.progress.push(ProgressEntry {
            kind,
            message,
            percent,
            timestamp,
        });
        self.operation.updated_at = timestamp;
    }
}

/// Shared state of a single operation
struct OperationEntry {
    id: String,
    record: Mutex<OperationRecord>,
    cancel: CancellationToken,
    state: watch::Sender<OperationState>,
}

impl OperationEntry {
    fn new(operation: Operation) -> Self {
        let (state, _) = watch::channel(operation.state);
        Self {
            id: operation.id.clone(),
            record: Mutex::new(OperationRecord {
                operation,
                progress: Vec::new(),
            }),
            cancel: CancellationToken::new(),
            state,
        }
    }

    fn snapshot(&self) -> Operation {
        lock(&self.record).operation.clone()
    }

    fn progress(&self) -> Vec<ProgressEntry> {
        lock(&self.record).progress.clone()
    }

    fn is_terminal(&self) -> bool {
        lock(&self.record).operation.state.is_terminal()
    }

    /// Append a progress entry; dropped once the operation is terminal
    fn append(&self, kind: ProgressKind, message: String, percent: Option<u8>) {
        let mut record = lock(&self.record);
        if record.operation.state.is_terminal() {
            return;
        }
        record.push(kind, message, percent);
    }

    /// Record the terminal state. Returns false if one was already recorded.
    fn finish(&self, state: OperationState, kind: ProgressKind, message: String) -> bool {
        {
            let mut record = lock(&self.record);
            if record.operation.state.is_terminal() {
                return false;
            }
            record.push(kind, message, None);
            record.operation.state = state;
        }
        self.state.send_replace(state);
        true
    }
}

/// Append-only progress log handed to the transfer engine
///
/// Only non-terminal kinds can be written here; the orchestrator records the
/// closing entry itself.
#[derive(Clone)]
pub struct ProgressSink {
    entry: Arc<OperationEntry>,
}

impl ProgressSink {
    pub fn message(&self, message: impl Into<String>) {
        self.entry.append(ProgressKind::Message, message.into(), None);
    }

    pub fn start(&self, message: impl Into<String>) {
        self.entry.append(ProgressKind::Start, message.into(), None);
    }

    /// Report a completion percentage (clamped to 100)
    pub fn progress(&self, message: impl Into<String>, percent: u8) {
        self.entry
            .append(ProgressKind::Progress, message.into(), Some(percent.min(100)));
    }

    pub fn end(&self, message: impl Into<String>) {
        self.entry.append(ProgressKind::End, message.into(), None);
    }
}

/// Service that creates, runs, and tracks push/pull operations
pub struct OperationService {
    repositories: Arc<RepositoryService>,
    registry: Arc<RemoteRegistry>,
    engine: Arc<dyn TransferEngine>,
    /// Repository name -> operations in creation order
    operations: RwLock<HashMap<String, Vec<Arc<OperationEntry>>>>,
}

impl OperationService {
    pub fn new(
        repositories: Arc<RepositoryService>,
        registry: Arc<RemoteRegistry>,
        engine: Arc<dyn TransferEngine>,
    ) -> Self {
        Self {
            repositories,
            registry,
            engine,
            operations: RwLock::new(HashMap::new()),
        }
    }

    /// Push a local commit to a remote
    pub async fn start_push(
        &self,
        repository: &str,
        remote_name: &str,
        commit_id: &str,
        parameters: Option<RemoteParameters>,
    ) -> Result<Operation> {
        let remote = self.repositories.get_remote(repository, remote_name)?;
        self.repositories.get_commit(repository, commit_id)?;
        let parameters = self.resolve_parameters(&remote, parameters)?;

        self.launch(repository, OperationType::Push, commit_id, remote, parameters)
    }

    /// Pull a commit from a remote; the commit must exist on the remote side
    pub async fn start_pull(
        &self,
        repository: &str,
        remote_name: &str,
        commit_id: &str,
        parameters: Option<RemoteParameters>,
    ) -> Result<Operation> {
        let remote = self.repositories.get_remote(repository, remote_name)?;
        let parameters = self.resolve_parameters(&remote, parameters)?;

        if !self
            .engine
            .remote_commit_exists(&remote, &parameters, commit_id)
            .await?
        {
            return Err(TitanError::CommitNotFound(commit_id.to_string()));
        }

        self.launch(repository, OperationType::Pull, commit_id, remote, parameters)
    }

    /// All operations for a repository, oldest first
    pub fn list_operations(&self, repository: &str) -> Result<Vec<Operation>> {
        self.repositories.get_repository(repository)?;

        let entries = read_lock(&self.operations)
            .get(repository)
            .cloned()
            .unwrap_or_default();

        Ok(entries.iter().map(|entry| entry.snapshot()).collect())
    }

    pub fn get_operation(&self, repository: &str, id: &str) -> Result<Operation> {
        Ok(self.find(repository, id)?.snapshot())
    }

    /// Snapshot of the progress log at call time
    pub fn get_progress(&self, repository: &str, id: &str) -> Result<Vec<ProgressEntry>> {
        Ok(self.find(repository, id)?.progress())
    }

    /// Request cancellation and wait for the operation to settle.
    ///
    /// Returns immediately if the operation is already terminal. The final
    /// state may still be `COMPLETE` if the transfer finished first.
    pub async fn abort_operation(&self, repository: &str, id: &str) -> Result<()> {
        let entry = self.find(repository, id)?;
        if entry.is_terminal() {
            return Ok(());
        }

        tracing::info!("Aborting operation {}", id);
        entry.cancel.cancel();

        let mut state = entry.state.subscribe();
        let _ = state.wait_for(|s| s.is_terminal()).await;
        Ok(())
    }

    /// Delete a repository together with its operations.
    ///
    /// Running operations are aborted and waited for before this returns.
    pub async fn delete_repository(&self, repository: &str) -> Result<()> {
        self.repositories.delete_repository(repository)?;

        let entries = write_lock(&self.operations)
            .remove(repository)
            .unwrap_or_default();
        let running: Vec<_> = entries.into_iter().filter(|e| !e.is_terminal()).collect();
        if !running.is_empty() {
            tracing::info!(
                "Aborting {} running operations of deleted repository {}",
                running.len(),
                repository
            );
        }

        for entry in &running {
            entry.cancel.cancel();
        }
        for entry in &running {
            let mut state = entry.state.subscribe();
            let _ = state.wait_for(|s| s.is_terminal()).await;
        }
        Ok(())
    }

    fn find(&self, repository: &str, id: &str) -> Result<Arc<OperationEntry>> {
        read_lock(&self.operations)
            .get(repository)
            .and_then(|entries| entries.iter().find(|entry| entry.id == id))
            .cloned()
            .ok_or_else(|| TitanError::OperationNotFound(id.to_string()))
    }

    fn resolve_parameters(
        &self,
        remote: &Remote,
        parameters: Option<RemoteParameters>,
    ) -> Result<RemoteParameters> {
        let defaults = self.registry.get_parameters(remote)?;
        match parameters {
            Some(parameters) => parameters.or_defaults(defaults),
            None => Ok(defaults),
        }
    }

    fn launch(
        &self,
        repository: &str,
        operation_type: OperationType,
        commit_id: &str,
        remote: Remote,
        parameters: RemoteParameters,
    ) -> Result<Operation> {
        let entry = {
            let mut operations = write_lock(&self.operations);
            // Re-checked under the lock so a concurrent delete cannot strand the operation
            self.repositories.get_repository(repository)?;

            let now = Utc::now();
            let operation = Operation {
                id: Uuid::new_v4().to_string(),
                repository: repository.to_string(),
                operation_type,
                remote_name: remote.name().to_string(),
                commit_id: commit_id.to_string(),
                state: OperationState::Running,
                created_at: now,
                updated_at: now,
            };

            let entry = Arc::new(OperationEntry::new(operation));
            operations
                .entry(repository.to_string())
                .or_default()
                .push(entry.clone());
            entry
        };

        let snapshot = entry.snapshot();
        tracing::info!(
            "Started {} operation {} for {}/{} with remote '{}'",
            operation_type,
            snapshot.id,
            repository,
            commit_id,
            remote.name()
        );

        let request = TransferRequest {
            repository: repository.to_string(),
            commit_id: commit_id.to_string(),
            remote,
            parameters,
        };
        tokio::spawn(run_transfer(self.engine.clone(), entry, operation_type, request));

        Ok(snapshot)
    }
}

/// Drive one transfer and record how it ended
async fn run_transfer(
    engine: Arc<dyn TransferEngine>,
    entry: Arc<OperationEntry>,
    operation_type: OperationType,
    request: TransferRequest,
) {
    let sink = ProgressSink {
        entry: entry.clone(),
    };
    let cancel = entry.cancel.clone();

    let transfer = async {
        match operation_type {
            OperationType::Push => engine.send_commit(&request, cancel, sink).await,
            OperationType::Pull => engine.receive_commit(&request, cancel, sink).await,
        }
    };

    let outcome = match AssertUnwindSafe(transfer).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(TransferError::Protocol(format!(
            "transfer panicked: {}",
            panic_message(panic.as_ref())
        ))),
    };

    resolve(&entry, outcome);
}

fn resolve(entry: &OperationEntry, outcome: std::result::Result<(), TransferError>) {
    let (state, kind, message) = match outcome {
        Ok(()) => (
            OperationState::Complete,
            ProgressKind::Complete,
            "Operation complete".to_string(),
        ),
        Err(TransferError::Cancelled) if entry.cancel.is_cancelled() => (
            OperationState::Aborted,
            ProgressKind::Abort,
            "Operation aborted".to_string(),
        ),
        Err(e) if entry.cancel.is_cancelled() => (
            OperationState::Aborted,
            ProgressKind::Abort,
            format!("Operation aborted: {}", e),
        ),
        // Only an abort request may end an operation as ABORTED
        Err(TransferError::Cancelled) => (
            OperationState::Failed,
            ProgressKind::Error,
            TransferError::Protocol("transfer cancelled without an abort request".to_string())
                .to_string(),
        ),
        Err(e) => (OperationState::Failed, ProgressKind::Error, e.to_string()),
    };

    if !entry.finish(state, kind, message.clone()) {
        tracing::debug!(
            "Operation {} already terminal, dropping {:?}",
            entry.id,
            state
        );
        return;
    }

    match state {
        OperationState::Failed => tracing::warn!("Operation {} failed: {}", entry.id, message),
        _ => tracing::info!("Operation {} finished: {:?}", entry.id, state),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
