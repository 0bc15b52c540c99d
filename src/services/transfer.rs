//! Transfer engine boundary
//!
//! The snapshot engine that actually moves commit data lives outside this
//! crate. The orchestrator drives it through [`TransferEngine`], handing it a
//! cancellation token and a progress sink for each operation.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Remote, RemoteParameters};
use crate::services::cancellation::CancellationToken;
use crate::services::operation_service::ProgressSink;

/// Failures reported by a transfer engine
#[derive(Error, Debug)]
pub enum TransferError {
    /// The transfer observed its cancellation token and stopped
    #[error("Transfer cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote rejected transfer: {0}")]
    Rejected(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Another transfer of the same commit is in the way
    #[error("Conflicting transfer: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the engine needs to move one commit
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub repository: String,
    pub commit_id: String,
    pub remote: Remote,
    pub parameters: RemoteParameters,
}

/// Trait for transfer engines
#[async_trait]
pub trait TransferEngine: Send + Sync {
    /// Send a local commit to the remote
    async fn send_commit(
        &self,
        request: &TransferRequest,
        cancel: CancellationToken,
        progress: ProgressSink,
    ) -> Result<(), TransferError>;

    /// Fetch a remote commit into the local repository
    async fn receive_commit(
        &self,
        request: &TransferRequest,
        cancel: CancellationToken,
        progress: ProgressSink,
    ) -> Result<(), TransferError>;

    /// Lightweight round trip to check a commit exists on the remote
    async fn remote_commit_exists(
        &self,
        remote: &Remote,
        parameters: &RemoteParameters,
        commit_id: &str,
    ) -> Result<bool, TransferError>;
}

/// Engine that moves no data
///
/// Honors the nop provider's `delay` parameter, waiting that many seconds
/// (or until cancelled) before reporting success.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopTransferEngine;

impl NopTransferEngine {
    async fn run(
        &self,
        verb: &str,
        request: &TransferRequest,
        cancel: &CancellationToken,
        progress: &ProgressSink,
    ) -> Result<(), TransferError> {
        let delay = match &request.parameters {
            RemoteParameters::Nop(params) => params.delay,
            _ => 0,
        };

        progress.start(format!(
            "{} commit {} with remote '{}'",
            verb,
            request.commit_id,
            request.remote.name()
        ));

        if delay > 0 {
            progress.message(format!("Waiting {}s", delay));
            tokio::select! {
                _ = cancel.cancelled() => return Err(TransferError::Cancelled),
                _ = tokio::time::sleep(Duration::from_secs(delay)) => {}
            }
        }
        cancel.check()?;

        progress.end("Nothing to transfer");
        Ok(())
    }
}

#[async_trait]
impl TransferEngine for NopTransferEngine {
    async fn send_commit(
        &self,
        request: &TransferRequest,
        cancel: CancellationToken,
        progress: ProgressSink,
    ) -> Result<(), TransferError> {
        self.run("Pushing", request, &cancel, &progress).await
    }

    async fn receive_commit(
        &self,
        request: &TransferRequest,
        cancel: CancellationToken,
        progress: ProgressSink,
    ) -> Result<(), TransferError> {
        self.run("Pulling", request, &cancel, &progress).await
    }

    async fn remote_commit_exists(
        &self,
        _remote: &Remote,
        _parameters: &RemoteParameters,
        _commit_id: &str,
    ) -> Result<bool, TransferError> {
        Ok(true)
    }
}
