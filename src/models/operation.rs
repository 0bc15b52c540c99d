//! Operation models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Push,
    Pull,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Push => f.write_str("push"),
            OperationType::Pull => f.write_str("pull"),
        }
    }
}

/// Lifecycle state of an operation
///
/// `Created -> Running -> {Complete, Failed, Aborted}`; terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationState {
    Created,
    Running,
    Complete,
    Failed,
    Aborted,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationState::Complete | OperationState::Failed | OperationState::Aborted
        )
    }
}

/// One push or pull attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub repository: String,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub remote_name: String,
    pub commit_id: String,
    pub state: OperationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Message,
    Start,
    Progress,
    End,
    Error,
    Abort,
    Complete,
}

impl ProgressKind {
    /// Kinds that close out an operation; only the orchestrator records these
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressKind::Error | ProgressKind::Abort | ProgressKind::Complete
        )
    }
}

/// A timestamped event in an operation's progress log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub kind: ProgressKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    pub timestamp: DateTime<Utc>,
}
