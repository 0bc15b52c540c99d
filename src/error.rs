//! Error types for Titan

use serde::Serialize;
use thiserror::Error;

use crate::services::transfer::TransferError;

/// Application error types
#[derive(Error, Debug)]
pub enum TitanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Configuration(String),

    #[error("Unknown remote provider or malformed remote identifier '{0}'")]
    UnknownProvider(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Repository already exists: {0}")]
    RepositoryExists(String),

    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    #[error("Remote already exists: {0}")]
    RemoteExists(String),

    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    #[error("Commit already exists: {0}")]
    CommitExists(String),

    #[error("Operation not found: {0}")]
    OperationNotFound(String),

    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),
}

impl TitanError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        TitanError::Configuration(message.into())
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            TitanError::Io(_) => "IO_ERROR",
            TitanError::Serialization(_) => "SERIALIZATION_ERROR",
            TitanError::Configuration(_) => "CONFIGURATION_ERROR",
            TitanError::UnknownProvider(_) => "UNKNOWN_PROVIDER",
            TitanError::RepositoryNotFound(_) => "REPO_NOT_FOUND",
            TitanError::RepositoryExists(_) => "REPO_EXISTS",
            TitanError::RemoteNotFound(_) => "REMOTE_NOT_FOUND",
            TitanError::RemoteExists(_) => "REMOTE_EXISTS",
            TitanError::CommitNotFound(_) => "COMMIT_NOT_FOUND",
            TitanError::CommitExists(_) => "COMMIT_EXISTS",
            TitanError::OperationNotFound(_) => "OPERATION_NOT_FOUND",
            TitanError::Transfer(_) => "TRANSFER_ERROR",
        }
    }

    /// HTTP status the API layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            TitanError::Configuration(_) | TitanError::UnknownProvider(_) => 400,
            TitanError::RepositoryNotFound(_)
            | TitanError::RemoteNotFound(_)
            | TitanError::CommitNotFound(_)
            | TitanError::OperationNotFound(_) => 404,
            TitanError::RepositoryExists(_)
            | TitanError::RemoteExists(_)
            | TitanError::CommitExists(_) => 409,
            TitanError::Transfer(_) => 502,
            TitanError::Io(_) | TitanError::Serialization(_) => 500,
        }
    }

    /// Whether this is a malformed-input error (bad URI, provider, or property)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TitanError::Configuration(_) | TitanError::UnknownProvider(_)
        )
    }

    /// Whether this is an unknown repository, remote, commit, or operation
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}

/// Serializable error response for the API layer
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<&TitanError> for ErrorResponse {
    fn from(error: &TitanError) -> Self {
        let details = match error {
            TitanError::Transfer(inner) => Some(format!("{:?}", inner)),
            _ => None,
        };

        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl From<TitanError> for ErrorResponse {
    fn from(error: TitanError) -> Self {
        ErrorResponse::from(&error)
    }
}

impl serde::Serialize for TitanError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

/// Result type alias for Titan operations
pub type Result<T> = std::result::Result<T, TitanError>;
