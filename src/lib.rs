//! Titan - versioned data volume server
//!
//! Manages repositories of commits and replicates them to and from remote
//! endpoints (a no-op sink, SSH hosts, S3-style object stores, and peer Titan
//! instances) through long-running, cancellable push/pull operations.

pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::ServerConfig;
use error::Result;
use services::{OperationService, RemoteRegistry, RepositoryService, TransferEngine};

/// Shared state handed to every command handler
#[derive(Clone)]
pub struct AppState {
    pub remotes: Arc<RemoteRegistry>,
    pub repositories: Arc<RepositoryService>,
    pub operations: Arc<OperationService>,
}

impl AppState {
    /// In-memory state driving `engine`
    pub fn new(engine: Arc<dyn TransferEngine>) -> Self {
        let remotes = Arc::new(RemoteRegistry::new());
        let repositories = Arc::new(RepositoryService::new(remotes.clone()));
        Self::assemble(remotes, repositories, engine)
    }

    /// State configured from `config`, persisted when it names a state file
    pub fn from_config(config: &ServerConfig, engine: Arc<dyn TransferEngine>) -> Result<Self> {
        let remotes = Arc::new(RemoteRegistry::new());
        let repositories = match &config.state_file {
            Some(path) => RepositoryService::open(path, remotes.clone())?,
            None => RepositoryService::new(remotes.clone()),
        };
        Ok(Self::assemble(remotes, Arc::new(repositories), engine))
    }

    fn assemble(
        remotes: Arc<RemoteRegistry>,
        repositories: Arc<RepositoryService>,
        engine: Arc<dyn TransferEngine>,
    ) -> Self {
        let operations = Arc::new(OperationService::new(
            repositories.clone(),
            remotes.clone(),
            engine,
        ));
        Self {
            remotes,
            repositories,
            operations,
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_filter`. Calling this more than once is harmless.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Initialize the server state
pub fn run(config: &ServerConfig, engine: Arc<dyn TransferEngine>) -> Result<AppState> {
    init_tracing(&config.log_filter);

    tracing::info!("Starting Titan server '{}' on port {}", config.identity, config.port);

    let state = AppState::from_config(config, engine)?;
    tracing::info!(
        "Server state ready with {} repositories",
        state.repositories.list_repositories().len()
    );
    Ok(state)
}
